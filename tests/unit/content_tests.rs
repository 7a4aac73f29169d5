/*!
 * Tests for the upstream content collaborator boundary
 */

use noveltrans::content::{FetchError, RemoteChapter, RemoteNovelMetadata, TocItem};

#[test]
fn test_remote_chapter_intoDocument_shouldKeepParagraphOrder() {
    let chapter = RemoteChapter {
        paragraphs: vec!["first".to_string(), "second".to_string()],
    };
    assert_eq!(chapter.into_document(), vec!["first", "second"]);
}

#[test]
fn test_fetch_error_display_shouldDistinguishVariants() {
    assert!(FetchError::RateLimited.to_string().contains("frequency too high"));
    assert!(FetchError::AccessDenied.to_string().contains("cannot access"));
    assert!(FetchError::Provider("504".to_string()).to_string().contains("504"));
}

#[test]
fn test_metadata_deserialize_withPartialToc_shouldDefaultOptionalFields() {
    let json = r#"{
        "title": "夜の図書館",
        "authors": ["佐藤"],
        "toc": [
            {"title": "第一章", "chapter_id": "1"},
            {"title": "幕間"}
        ]
    }"#;

    let metadata: RemoteNovelMetadata = serde_json::from_str(json).unwrap();
    assert_eq!(metadata.title, "夜の図書館");
    assert_eq!(metadata.toc.len(), 2);
    assert_eq!(metadata.toc[0].chapter_id.as_deref(), Some("1"));
    assert!(metadata.toc[1].chapter_id.is_none());
    assert!(metadata.toc[1].create_at.is_none());
}

#[test]
fn test_toc_item_serialize_shouldRoundTrip() {
    let item = TocItem {
        title: "第二章".to_string(),
        chapter_id: Some("2".to_string()),
        create_at: None,
    };
    let json = serde_json::to_string(&item).unwrap();
    let back: TocItem = serde_json::from_str(&json).unwrap();
    assert_eq!(back.title, "第二章");
    assert_eq!(back.chapter_id.as_deref(), Some("2"));
}
