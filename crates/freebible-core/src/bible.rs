//! The bible-text hierarchy: version → book → chapter → verse.
//!
//! Each level hangs off its parent through a foreign key. Hard deletes
//! cascade down the chain; soft deletes do not unless explicitly asked to.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
  entity::{Column, ColumnKind, Entity, Parent, Table},
  lifecycle::Lifecycle,
};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Language of a bible version.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
pub enum Language {
  #[serde(rename = "PT")]
  #[strum(serialize = "PT")]
  Portuguese,
  #[serde(rename = "EN")]
  #[strum(serialize = "EN")]
  English,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
pub enum Testament {
  #[serde(rename = "V")]
  #[strum(serialize = "V")]
  Old,
  #[serde(rename = "N")]
  #[strum(serialize = "N")]
  New,
}

macro_rules! book_codes {
  ($($variant:ident => $code:literal, $name:literal, $testament:ident;)*) => {
    /// One of the 66 canonical book codes.
    #[derive(
      Debug,
      Clone,
      Copy,
      PartialEq,
      Eq,
      Hash,
      Serialize,
      Deserialize,
      EnumIter,
      EnumString,
      IntoStaticStr,
    )]
    pub enum BookCode {
      $(
        #[serde(rename = $code)]
        #[strum(serialize = $code)]
        $variant,
      )*
    }

    impl BookCode {
      /// Display name of the book.
      pub fn name(self) -> &'static str {
        match self {
          $(Self::$variant => $name,)*
        }
      }

      /// The testament the book canonically belongs to.
      pub fn testament(self) -> Testament {
        match self {
          $(Self::$variant => Testament::$testament,)*
        }
      }
    }
  };
}

book_codes! {
  Genesis        => "GN",  "Gênesis",             Old;
  Exodus         => "EX",  "Êxodo",               Old;
  Leviticus      => "LV",  "Levítico",            Old;
  Numbers        => "NM",  "Números",             Old;
  Deuteronomy    => "DT",  "Deuteronômio",        Old;
  Joshua         => "JS",  "Josué",               Old;
  Judges         => "JZ",  "Juízes",              Old;
  Ruth           => "RT",  "Rute",                Old;
  FirstSamuel    => "1SM", "1 Samuel",            Old;
  SecondSamuel   => "2SM", "2 Samuel",            Old;
  FirstKings     => "1RS", "1 Reis",              Old;
  SecondKings    => "2RS", "2 Reis",              Old;
  FirstChronicles  => "1CR", "1 Crônicas",        Old;
  SecondChronicles => "2CR", "2 Crônicas",        Old;
  Ezra           => "ED",  "Esdras",              Old;
  Nehemiah       => "NE",  "Neemias",             Old;
  Esther         => "ET",  "Ester",               Old;
  Job            => "JB",  "Jó",                  Old;
  Psalms         => "SL",  "Salmos",              Old;
  Proverbs       => "PV",  "Provérbios",          Old;
  Ecclesiastes   => "EC",  "Eclesiastes",         Old;
  SongOfSongs    => "CT",  "Cânticos de Salomão", Old;
  Isaiah         => "IS",  "Isaías",              Old;
  Jeremiah       => "JR",  "Jeremias",            Old;
  Lamentations   => "LM",  "Lamentações",         Old;
  Ezekiel        => "EZ",  "Ezequiel",            Old;
  Daniel         => "DN",  "Daniel",              Old;
  Hosea          => "OS",  "Oséias",              Old;
  Joel           => "JL",  "Joel",                Old;
  Amos           => "AM",  "Amós",                Old;
  Obadiah        => "OB",  "Obadias",             Old;
  Jonah          => "JN",  "Jonas",               Old;
  Micah          => "MQ",  "Miquéias",            Old;
  Nahum          => "NA",  "Naum",                Old;
  Habakkuk       => "HC",  "Habacuque",           Old;
  Zephaniah      => "SF",  "Sofonias",            Old;
  Haggai         => "AG",  "Ageu",                Old;
  Zechariah      => "ZC",  "Zacarias",            Old;
  Malachi        => "ML",  "Malaquias",           Old;
  Matthew        => "MT",  "Mateus",              New;
  Mark           => "MC",  "Marcos",              New;
  Luke           => "LC",  "Lucas",               New;
  John           => "JO",  "João",                New;
  Acts           => "AT",  "Atos",                New;
  Romans         => "RM",  "Romanos",             New;
  FirstCorinthians  => "1CO", "1 Coríntios",      New;
  SecondCorinthians => "2CO", "2 Coríntios",      New;
  Galatians      => "GL",  "Gálatas",             New;
  Ephesians      => "EF",  "Efésios",             New;
  Philippians    => "FP",  "Filipenses",          New;
  Colossians     => "CL",  "Colossenses",         New;
  FirstThessalonians  => "1TS", "1 Tessalonicenses", New;
  SecondThessalonians => "2TS", "2 Tessalonicenses", New;
  FirstTimothy   => "1TM", "1 Timóteo",           New;
  SecondTimothy  => "2TM", "2 Timóteo",           New;
  Titus          => "TT",  "Tito",                New;
  Philemon       => "FM",  "Filemom",             New;
  Hebrews        => "HB",  "Hebreus",             New;
  James          => "TG",  "Tiago",               New;
  FirstPeter     => "1PE", "1 Pedro",             New;
  SecondPeter    => "2PE", "2 Pedro",             New;
  FirstJohn      => "1JO", "1 João",              New;
  SecondJohn     => "2JO", "2 João",              New;
  ThirdJohn      => "3JO", "3 João",              New;
  Jude           => "JD",  "Judas",               New;
  Revelation     => "AP",  "Apocalipse",          New;
}

// ─── Tables ──────────────────────────────────────────────────────────────────

pub const BIBLE_VERSIONS: Table = Table {
  name:    "bible_versions",
  label:   "bible version",
  columns: &[
    Column::new("code", ColumnKind::GeneratedUuid).exact(),
    Column::new("language", ColumnKind::Text).exact(),
    Column::new("label", ColumnKind::Text).contains(),
  ],
  parent:  None,
};

pub const BOOKS: Table = Table {
  name:    "books",
  label:   "book",
  columns: &[
    Column::new("bible_version_id", ColumnKind::ForeignKey).exact(),
    Column::new("code", ColumnKind::Text).exact(),
    Column::new("testament", ColumnKind::Text).exact(),
  ],
  parent:  Some(Parent {
    column: "bible_version_id",
    table:  BIBLE_VERSIONS.name,
  }),
};

pub const CHAPTERS: Table = Table {
  name:    "chapters",
  label:   "chapter",
  columns: &[
    Column::new("book_id", ColumnKind::ForeignKey).exact(),
    Column::new("author", ColumnKind::Text).contains(),
    Column::new("number", ColumnKind::Integer).exact(),
  ],
  parent:  Some(Parent { column: "book_id", table: BOOKS.name }),
};

pub const VERSES: Table = Table {
  name:    "verses",
  label:   "verse",
  columns: &[
    Column::new("chapter_id", ColumnKind::ForeignKey).exact(),
    Column::new("number", ColumnKind::Integer).exact(),
    Column::new("text", ColumnKind::Text).contains(),
  ],
  parent:  Some(Parent { column: "chapter_id", table: CHAPTERS.name }),
};

// ─── BibleVersion ────────────────────────────────────────────────────────────

/// A translation of the bible, e.g. Almeida in Portuguese.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibleVersion {
  pub id:        i64,
  /// Public identifier; assigned on creation and never changed.
  pub code:      Uuid,
  pub language:  Language,
  pub label:     Option<String>,
  #[serde(flatten)]
  pub lifecycle: Lifecycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBibleVersion {
  pub language: Language,
  #[validate(length(max = 100))]
  pub label:    Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BibleVersionPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language: Option<Language>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(length(max = 100))]
  pub label:    Option<String>,
}

impl Entity for BibleVersion {
  type Draft = NewBibleVersion;
  type Patch = BibleVersionPatch;

  const TABLE: Table = BIBLE_VERSIONS;

  fn id(&self) -> i64 { self.id }

  fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
}

// ─── Book ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
  pub id:               i64,
  pub bible_version_id: i64,
  pub code:             BookCode,
  pub testament:        Testament,
  #[serde(flatten)]
  pub lifecycle:        Lifecycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "check_new_book_testament"))]
pub struct NewBook {
  pub bible_version_id: i64,
  pub code:             BookCode,
  pub testament:        Testament,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BookPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bible_version_id: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub code:             Option<BookCode>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub testament:        Option<Testament>,
}

fn check_testament(code: BookCode, testament: Testament) -> Result<(), ValidationError> {
  if code.testament() == testament {
    return Ok(());
  }
  let mut err = ValidationError::new("testament_mismatch");
  err.message = Some(
    format!("{} does not belong to the {:?} testament", code.name(), testament).into(),
  );
  Err(err)
}

fn check_new_book_testament(book: &NewBook) -> Result<(), ValidationError> {
  check_testament(book.code, book.testament)
}


impl Entity for Book {
  type Draft = NewBook;
  type Patch = BookPatch;

  const TABLE: Table = BOOKS;

  fn id(&self) -> i64 { self.id }

  fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }

  fn check_patch(&self, patch: &BookPatch) -> Result<(), ValidationErrors> {
    let code = patch.code.unwrap_or(self.code);
    let testament = patch.testament.unwrap_or(self.testament);
    check_testament(code, testament).map_err(|err| {
      let mut errors = ValidationErrors::new();
      errors.add("__all__", err);
      errors
    })
  }
}

// ─── Chapter ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
  pub id:        i64,
  pub book_id:   i64,
  pub author:    Option<String>,
  pub number:    u32,
  #[serde(flatten)]
  pub lifecycle: Lifecycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewChapter {
  pub book_id: i64,
  #[validate(length(max = 100))]
  pub author:  Option<String>,
  #[validate(range(min = 1))]
  pub number:  u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ChapterPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub book_id: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(length(max = 100))]
  pub author:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(range(min = 1))]
  pub number:  Option<u32>,
}

impl Entity for Chapter {
  type Draft = NewChapter;
  type Patch = ChapterPatch;

  const TABLE: Table = CHAPTERS;

  fn id(&self) -> i64 { self.id }

  fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
}

// ─── Verse ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verse {
  pub id:         i64,
  pub chapter_id: i64,
  pub number:     u32,
  pub text:       Option<String>,
  #[serde(flatten)]
  pub lifecycle:  Lifecycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVerse {
  pub chapter_id: i64,
  #[validate(range(min = 1))]
  pub number:     u32,
  pub text:       Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VersePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub chapter_id: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(range(min = 1))]
  pub number:     Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text:       Option<String>,
}

impl Entity for Verse {
  type Draft = NewVerse;
  type Patch = VersePatch;

  const TABLE: Table = VERSES;

  fn id(&self) -> i64 { self.id }

  fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn canon_has_66_books() {
    assert_eq!(BookCode::iter().count(), 66);
    let old = BookCode::iter().filter(|b| b.testament() == Testament::Old).count();
    assert_eq!(old, 39);
  }

  #[test]
  fn book_codes_parse_and_serialise_alike() {
    for code in BookCode::iter() {
      let s: &'static str = code.into();
      assert_eq!(BookCode::from_str(s).unwrap(), code);
      assert_eq!(serde_json::to_value(code).unwrap(), serde_json::json!(s));
    }
    assert_eq!(BookCode::from_str("1SM").unwrap(), BookCode::FirstSamuel);
    assert!(BookCode::from_str("XX").is_err());
  }

  #[test]
  fn new_book_rejects_wrong_testament() {
    let book = NewBook {
      bible_version_id: 1,
      code:             BookCode::Genesis,
      testament:        Testament::New,
    };
    assert!(book.validate().is_err());

    let book = NewBook { testament: Testament::Old, ..book };
    assert!(book.validate().is_ok());
  }

  #[test]
  fn book_patch_is_checked_against_the_stored_testament() {
    let genesis = Book {
      id:               1,
      bible_version_id: 1,
      code:             BookCode::Genesis,
      testament:        Testament::Old,
      lifecycle:        Lifecycle::new(chrono::Utc::now()),
    };

    let to_matthew = BookPatch { code: Some(BookCode::Matthew), ..Default::default() };
    let errors = genesis.check_patch(&to_matthew).unwrap_err();
    assert!(errors.field_errors().contains_key("__all__"));

    let to_new = BookPatch { testament: Some(Testament::New), ..Default::default() };
    assert!(genesis.check_patch(&to_new).is_err());

    let both = BookPatch {
      code: Some(BookCode::Matthew),
      testament: Some(Testament::New),
      ..Default::default()
    };
    assert!(genesis.check_patch(&both).is_ok());
    assert!(genesis.check_patch(&BookPatch::default()).is_ok());
  }

  #[test]
  fn chapter_number_must_be_positive() {
    let chapter = NewChapter { book_id: 1, author: None, number: 0 };
    let errors = chapter.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("number"));
  }

  #[test]
  fn patch_serialises_only_present_fields() {
    let patch = VersePatch { text: Some("Haja luz".into()), ..Default::default() };
    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json, serde_json::json!({ "text": "Haja luz" }));
  }

  #[test]
  fn record_json_is_flat() {
    let verse = Verse {
      id:         7,
      chapter_id: 1,
      number:     1,
      text:       Some("No princípio".into()),
      lifecycle:  Lifecycle::new(chrono::Utc::now()),
    };
    let json = serde_json::to_value(&verse).unwrap();
    assert_eq!(json["is_active"], serde_json::json!(true));
    assert!(json["deleted_at"].is_null());

    let back: Verse = serde_json::from_value(json).unwrap();
    assert_eq!(back.id, 7);
    assert!(back.lifecycle.is_visible());
  }
}
