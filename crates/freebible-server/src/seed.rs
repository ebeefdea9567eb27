//! Default data: the Almeida version with the opening of Genesis.
//!
//! Every step looks for a visible record first, so seeding an already
//! seeded store is a no-op.

use freebible_core::{
  bible::{
    BibleVersion, Book, BookCode, Chapter, Language, NewBibleVersion, NewBook, NewChapter,
    NewVerse, Verse,
  },
  entity::Entity,
  lifecycle::Scope,
  search::SearchQuery,
  store::BibleStore,
};

const VERSION_LABEL: &str = "Almeida";
const CHAPTER_AUTHOR: &str = "Moisés";

const GENESIS_1: &[(u32, &str)] = &[
  (1, "No princípio, criou Deus os céus e a terra."),
  (2, "E a terra era sem forma e vazia; e havia trevas sobre a face do abismo."),
];

/// What a seeding run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
  pub created: usize,
  pub existing: usize,
}

async fn find_or_insert<S, E>(
  store: &S,
  query: SearchQuery,
  draft: impl FnOnce() -> E::Draft,
  report: &mut SeedReport,
) -> Result<E, S::Error>
where
  S: BibleStore,
  E: Entity,
{
  let found: Vec<E> = store.search(&query, Scope::Visible).await?;
  if let Some(record) = found.into_iter().next() {
    report.existing += 1;
    return Ok(record);
  }
  let record = store.insert::<E>(draft()).await?;
  tracing::info!(table = E::TABLE.name, id = record.id(), "seeded");
  report.created += 1;
  Ok(record)
}

/// Create whatever part of the default data is missing.
pub async fn seed_defaults<S>(store: &S) -> Result<SeedReport, S::Error>
where
  S: BibleStore,
{
  let mut report = SeedReport::default();
  let language: &'static str = Language::Portuguese.into();

  let version: BibleVersion = find_or_insert(
    store,
    SearchQuery::new().exact("language", language).exact("label", VERSION_LABEL),
    || NewBibleVersion {
      language: Language::Portuguese,
      label:    Some(VERSION_LABEL.to_owned()),
    },
    &mut report,
  )
  .await?;

  let genesis = BookCode::Genesis;
  let code: &'static str = genesis.into();
  let book: Book = find_or_insert(
    store,
    SearchQuery::new().exact("bible_version_id", version.id).exact("code", code),
    || NewBook {
      bible_version_id: version.id,
      code:             genesis,
      testament:        genesis.testament(),
    },
    &mut report,
  )
  .await?;

  let chapter: Chapter = find_or_insert(
    store,
    SearchQuery::new().exact("book_id", book.id).exact("number", 1_i64),
    || NewChapter {
      book_id: book.id,
      author:  Some(CHAPTER_AUTHOR.to_owned()),
      number:  1,
    },
    &mut report,
  )
  .await?;

  for &(number, text) in GENESIS_1 {
    let _: Verse = find_or_insert(
      store,
      SearchQuery::new()
        .exact("chapter_id", chapter.id)
        .exact("number", i64::from(number)),
      || NewVerse {
        chapter_id: chapter.id,
        number,
        text: Some(text.to_owned()),
      },
      &mut report,
    )
    .await?;
  }

  Ok(report)
}
