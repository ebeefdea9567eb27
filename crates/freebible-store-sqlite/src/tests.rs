//! Integration tests for `SqliteStore` against an in-memory database.

use freebible_core::{
  bible::{
    BibleVersion, BibleVersionPatch, Book, BookCode, Chapter, ChapterPatch, Language,
    NewBibleVersion, NewBook, NewChapter, NewVerse, Testament, Verse, VersePatch,
  },
  lifecycle::Scope,
  search::SearchQuery,
  store::BibleStore,
  user::{NewUser, User, UserPatch},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Almeida → Genesis → chapter 1 → verse 1.
async fn genesis(s: &SqliteStore) -> (BibleVersion, Book, Chapter, Verse) {
  let version: BibleVersion = s
    .insert(NewBibleVersion {
      language: Language::Portuguese,
      label:    Some("Almeida".into()),
    })
    .await
    .unwrap();
  let book: Book = s
    .insert(NewBook {
      bible_version_id: version.id,
      code:             BookCode::Genesis,
      testament:        Testament::Old,
    })
    .await
    .unwrap();
  let chapter: Chapter = s
    .insert(NewChapter {
      book_id: book.id,
      author:  Some("Moisés".into()),
      number:  1,
    })
    .await
    .unwrap();
  let verse: Verse = s
    .insert(NewVerse {
      chapter_id: chapter.id,
      number:     1,
      text:       Some("No princípio, criou Deus os céus e a terra.".into()),
    })
    .await
    .unwrap();
  (version, book, chapter, verse)
}

fn is_core(err: &Error, pred: impl Fn(&freebible_core::Error) -> bool) -> bool {
  matches!(err, Error::Core(inner) if pred(inner))
}

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_assigns_id_code_and_lifecycle() {
  let s = store().await;
  let (version, book, chapter, verse) = genesis(&s).await;

  assert!(version.id > 0);
  assert!(!version.code.is_nil());
  assert_eq!(version.code.get_version_num(), 4);
  assert!(version.lifecycle.is_visible());
  assert_eq!(version.lifecycle.created_at, version.lifecycle.updated_at);

  assert_eq!(book.bible_version_id, version.id);
  assert_eq!(chapter.author.as_deref(), Some("Moisés"));
  assert_eq!(verse.chapter_id, chapter.id);
}

#[tokio::test]
async fn versions_get_distinct_codes() {
  let s = store().await;
  let draft = || NewBibleVersion { language: Language::English, label: None };
  let a: BibleVersion = s.insert(draft()).await.unwrap();
  let b: BibleVersion = s.insert(draft()).await.unwrap();
  assert_ne!(a.code, b.code);
  assert_eq!(a.label, None);
}

#[tokio::test]
async fn insert_under_missing_parent_is_rejected() {
  let s = store().await;
  let err = s
    .insert::<Chapter>(NewChapter { book_id: 999, author: None, number: 1 })
    .await
    .unwrap_err();
  assert!(is_core(&err, |e| e.field() == Some("book_id")));
}

#[tokio::test]
async fn insert_under_soft_deleted_parent_is_rejected() {
  let s = store().await;
  let (_, _, chapter, _) = genesis(&s).await;
  s.soft_delete::<Chapter>(chapter.id, false).await.unwrap();

  let err = s
    .insert::<Verse>(NewVerse { chapter_id: chapter.id, number: 2, text: None })
    .await
    .unwrap_err();
  assert!(is_core(&err, |e| matches!(
    e,
    freebible_core::Error::ParentNotVisible { table: "chapter", .. }
  )));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
  let s = store().await;
  let ana = NewUser::new("ana@example.com", "hash".into(), 1, "Ana").unwrap();
  s.insert::<User>(ana).await.unwrap();

  let again = NewUser::new("ana@EXAMPLE.com", "hash".into(), 2, "Ana Two").unwrap();
  let err = s.insert::<User>(again).await.unwrap_err();
  assert!(is_core(&err, |e| e.field() == Some("email")));
}

#[tokio::test]
async fn duplicate_employee_number_is_a_conflict() {
  let s = store().await;
  s.insert::<User>(NewUser::new("a@x.org", "h".into(), 7, "A").unwrap())
    .await
    .unwrap();
  let err = s
    .insert::<User>(NewUser::new("b@x.org", "h".into(), 7, "B").unwrap())
    .await
    .unwrap_err();
  assert!(is_core(&err, |e| e.field() == Some("employee_number")));
}

// ─── Updates ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn patch_touches_only_given_fields() {
  let s = store().await;
  let (_, _, _, verse) = genesis(&s).await;

  let patched: Verse = s
    .patch(verse.id, VersePatch { number: Some(3), ..Default::default() })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(patched.number, 3);
  assert_eq!(patched.text, verse.text);
  assert_eq!(patched.lifecycle.created_at, verse.lifecycle.created_at);
  assert!(patched.lifecycle.updated_at >= verse.lifecycle.updated_at);
}

#[tokio::test]
async fn replace_overwrites_every_field() {
  let s = store().await;
  let (_, _, chapter, verse) = genesis(&s).await;

  let replaced: Verse = s
    .replace(verse.id, NewVerse { chapter_id: chapter.id, number: 9, text: None })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(replaced.number, 9);
  assert_eq!(replaced.text, None);
}

#[tokio::test]
async fn update_of_hidden_record_returns_none() {
  let s = store().await;
  let (version, ..) = genesis(&s).await;
  s.soft_delete::<BibleVersion>(version.id, false).await.unwrap();

  let patched = s
    .patch::<BibleVersion>(
      version.id,
      BibleVersionPatch { label: Some("ARC".into()), ..Default::default() },
    )
    .await
    .unwrap();
  assert!(patched.is_none());
}

#[tokio::test]
async fn patch_cannot_move_chapter_under_deleted_book() {
  let s = store().await;
  let (version, _, chapter, _) = genesis(&s).await;
  let exodus: Book = s
    .insert(NewBook {
      bible_version_id: version.id,
      code:             BookCode::Exodus,
      testament:        Testament::Old,
    })
    .await
    .unwrap();
  s.soft_delete::<Book>(exodus.id, false).await.unwrap();

  let err = s
    .patch::<Chapter>(chapter.id, ChapterPatch { book_id: Some(exodus.id), ..Default::default() })
    .await
    .unwrap_err();
  assert!(is_core(&err, |e| e.field() == Some("book_id")));
}

#[tokio::test]
async fn missing_record_wins_over_bad_parent() {
  let s = store().await;
  let (_, _, chapter, _) = genesis(&s).await;
  s.soft_delete::<Chapter>(chapter.id, false).await.unwrap();

  let patched = s
    .patch::<Chapter>(chapter.id, ChapterPatch { book_id: Some(999), ..Default::default() })
    .await
    .unwrap();
  assert!(patched.is_none());

  let replaced = s
    .replace::<Chapter>(4242, NewChapter { book_id: 999, author: None, number: 3 })
    .await
    .unwrap();
  assert!(replaced.is_none());
}

#[tokio::test]
async fn user_patch_keeps_password_hash() {
  let s = store().await;
  let ana: User = s
    .insert(NewUser::new("ana@example.com", "secret-hash".into(), 1, "Ana").unwrap())
    .await
    .unwrap();

  let renamed: User = s
    .patch(ana.id, UserPatch { name: Some("Ana Souza".into()), ..Default::default() })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.name, "Ana Souza");
  assert_eq!(renamed.password_hash, "secret-hash");
  assert_eq!(renamed.code, ana.code);
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn soft_delete_hides_from_default_queries() {
  let s = store().await;
  let (_, book, ..) = genesis(&s).await;

  let deleted: Book = s.soft_delete(book.id, false).await.unwrap().unwrap();
  assert!(!deleted.lifecycle.is_active);
  assert!(deleted.lifecycle.deleted_at.is_some());

  assert!(s.get::<Book>(book.id, Scope::Visible).await.unwrap().is_none());
  assert!(s.list::<Book>(Scope::Visible).await.unwrap().is_empty());
  assert!(s.get::<Book>(book.id, Scope::All).await.unwrap().is_some());
}

#[tokio::test]
async fn soft_delete_is_idempotent() {
  let s = store().await;
  let (.., verse) = genesis(&s).await;

  let first: Verse = s.soft_delete(verse.id, false).await.unwrap().unwrap();
  let second: Verse = s.soft_delete(verse.id, false).await.unwrap().unwrap();
  assert!(!second.lifecycle.is_active);
  assert!(second.lifecycle.deleted_at >= first.lifecycle.deleted_at);
}

#[tokio::test]
async fn soft_delete_of_missing_row_returns_none() {
  let s = store().await;
  assert!(s.soft_delete::<Verse>(42, false).await.unwrap().is_none());
}

#[tokio::test]
async fn soft_delete_leaves_children_visible() {
  let s = store().await;
  let (_, book, chapter, verse) = genesis(&s).await;

  s.soft_delete::<Book>(book.id, false).await.unwrap();

  assert!(s.get::<Chapter>(chapter.id, Scope::Visible).await.unwrap().is_some());
  assert!(s.get::<Verse>(verse.id, Scope::Visible).await.unwrap().is_some());
}

#[tokio::test]
async fn cascading_soft_delete_hides_descendants() {
  let s = store().await;
  let (version, book, chapter, verse) = genesis(&s).await;

  s.soft_delete::<BibleVersion>(version.id, true).await.unwrap();

  assert!(s.get::<Book>(book.id, Scope::Visible).await.unwrap().is_none());
  assert!(s.get::<Chapter>(chapter.id, Scope::Visible).await.unwrap().is_none());
  assert!(s.get::<Verse>(verse.id, Scope::Visible).await.unwrap().is_none());
  assert_eq!(s.list::<Verse>(Scope::Inactive).await.unwrap().len(), 1);
}

#[tokio::test]
async fn recover_restores_only_the_target() {
  let s = store().await;
  let (version, book, ..) = genesis(&s).await;
  s.soft_delete::<BibleVersion>(version.id, true).await.unwrap();

  let book_back: Book = s.recover(book.id).await.unwrap().unwrap();
  assert!(book_back.lifecycle.is_visible());

  assert!(s.get::<BibleVersion>(version.id, Scope::Visible).await.unwrap().is_none());
  assert!(s.list::<Chapter>(Scope::Visible).await.unwrap().is_empty());
}

#[tokio::test]
async fn recover_of_missing_row_returns_none() {
  let s = store().await;
  assert!(s.recover::<Book>(5).await.unwrap().is_none());
}

// ─── Hard delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn hard_delete_cascades_through_foreign_keys() {
  let s = store().await;
  let (version, book, chapter, verse) = genesis(&s).await;

  assert!(s.hard_delete::<BibleVersion>(version.id).await.unwrap());

  assert!(s.get::<BibleVersion>(version.id, Scope::All).await.unwrap().is_none());
  assert!(s.get::<Book>(book.id, Scope::All).await.unwrap().is_none());
  assert!(s.get::<Chapter>(chapter.id, Scope::All).await.unwrap().is_none());
  assert!(s.get::<Verse>(verse.id, Scope::All).await.unwrap().is_none());

  assert!(!s.hard_delete::<BibleVersion>(version.id).await.unwrap());
}

// ─── Scopes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scopes_partition_rows() {
  let s = store().await;
  let (version, ..) = genesis(&s).await;
  let other: BibleVersion = s
    .insert(NewBibleVersion { language: Language::English, label: Some("KJV".into()) })
    .await
    .unwrap();
  s.soft_delete::<BibleVersion>(other.id, false).await.unwrap();

  let ids = |v: Vec<BibleVersion>| v.into_iter().map(|r| r.id).collect::<Vec<_>>();
  assert_eq!(ids(s.list(Scope::Visible).await.unwrap()), vec![version.id]);
  assert_eq!(ids(s.list(Scope::Active).await.unwrap()), vec![version.id]);
  assert_eq!(ids(s.list(Scope::Inactive).await.unwrap()), vec![other.id]);
  assert_eq!(ids(s.list(Scope::All).await.unwrap()), vec![version.id, other.id]);
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_verses_by_chapter() {
  let s = store().await;
  let (_, _, chapter, verse) = genesis(&s).await;
  let second: Verse = s
    .insert(NewVerse {
      chapter_id: chapter.id,
      number:     2,
      text:       Some("E a terra era sem forma e vazia.".into()),
    })
    .await
    .unwrap();

  let query = SearchQuery::new().exact("chapter_id", chapter.id);
  let found: Vec<Verse> = s.search(&query, Scope::Visible).await.unwrap();
  assert_eq!(found.iter().map(|v| v.id).collect::<Vec<_>>(), vec![verse.id, second.id]);
}

#[tokio::test]
async fn contains_search_ignores_case() {
  let s = store().await;
  genesis(&s).await;

  let hit = SearchQuery::new().contains("text", "PRINCÍPIO");
  let found: Vec<Verse> = s.search(&hit, Scope::Visible).await.unwrap();
  assert_eq!(found.len(), 1);

  let miss = SearchQuery::new().contains("text", "trevas");
  let found: Vec<Verse> = s.search(&miss, Scope::Visible).await.unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn filters_are_combined_with_and() {
  let s = store().await;
  let (_, _, chapter, _) = genesis(&s).await;

  let query = SearchQuery::new().exact("chapter_id", chapter.id).exact("number", 2_i64);
  let found: Vec<Verse> = s.search(&query, Scope::Visible).await.unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn search_skips_soft_deleted_rows() {
  let s = store().await;
  let (_, book, ..) = genesis(&s).await;
  s.soft_delete::<Book>(book.id, false).await.unwrap();

  let query = SearchQuery::new().exact("code", "GN");
  let found: Vec<Book> = s.search(&query, Scope::Visible).await.unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn search_on_unknown_column_fails() {
  let s = store().await;
  let query = SearchQuery::new().exact("password", "x");
  let err = s.search::<User>(&query, Scope::Visible).await.unwrap_err();
  assert!(matches!(err, Error::UnknownColumn { column: "password", .. }));
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_user_by_email_normalises_domain() {
  let s = store().await;
  let ana: User = s
    .insert(NewUser::new("Ana@Example.com", "hash".into(), 1, "Ana").unwrap())
    .await
    .unwrap();
  assert_eq!(ana.email, "Ana@example.com");

  let found = s.find_user_by_email(" Ana@EXAMPLE.COM").await.unwrap().unwrap();
  assert_eq!(found.id, ana.id);
  assert_eq!(found.collaborator_name, "Ana");

  assert!(s.find_user_by_email("ana@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn soft_deleted_user_cannot_be_found() {
  let s = store().await;
  let ana: User = s
    .insert(NewUser::new("ana@example.com", "hash".into(), 1, "Ana").unwrap())
    .await
    .unwrap();
  s.soft_delete::<User>(ana.id, false).await.unwrap();
  assert!(s.find_user_by_email("ana@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn superuser_flags_round_trip() {
  let s = store().await;
  let root: User = s
    .insert(NewUser::new("root@example.com", "h".into(), 1, "Root").unwrap().into_superuser())
    .await
    .unwrap();
  assert!(root.is_staff && root.is_superuser);

  let staff = SearchQuery::new().exact("is_staff", true);
  let found: Vec<User> = s.search(&staff, Scope::Visible).await.unwrap();
  assert_eq!(found.len(), 1);
}
