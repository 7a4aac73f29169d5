/*!
 * Tests for script detection heuristics
 */

use noveltrans::language_utils::{
    detect_source_language, has_english_chars, has_hangul_chars, has_hanzi, has_kana_chars,
    language_display_name,
};

#[test]
fn test_detect_source_language_withHangul_shouldReturnKorean() {
    assert_eq!(detect_source_language("안녕하세요"), "kor");
}

#[test]
fn test_detect_source_language_withKanaOnly_shouldReturnJapanese() {
    assert_eq!(detect_source_language("こんにちは"), "jp");
    assert_eq!(detect_source_language("カタカナ"), "jp");
}

#[test]
fn test_detect_source_language_withHanOnly_shouldReturnJapanese() {
    assert_eq!(detect_source_language("夜明"), "jp");
}

#[test]
fn test_detect_source_language_withLatinOnly_shouldReturnEnglish() {
    assert_eq!(detect_source_language("Hello world"), "en");
}

#[test]
fn test_detect_source_language_withNoKnownScript_shouldDefaultToJapanese() {
    assert_eq!(detect_source_language("1234 !?"), "jp");
    assert_eq!(detect_source_language(""), "jp");
}

#[test]
fn test_detect_source_language_withMixedScripts_shouldFollowPriorityOrder() {
    // Hangul wins over everything else present in the text
    assert_eq!(detect_source_language("hello 안녕 こんにちは"), "kor");
    // Kana wins over Latin
    assert_eq!(detect_source_language("hello こんにちは"), "jp");
}

#[test]
fn test_script_checks_shouldMatchOnlyTheirScript() {
    assert!(has_hangul_chars("안녕"));
    assert!(!has_hangul_chars("こんにちは"));

    assert!(has_kana_chars("ひらがな"));
    assert!(!has_kana_chars("漢字"));

    assert!(has_hanzi("漢字"));
    assert!(!has_hanzi("abc"));

    assert!(has_english_chars("abc"));
    assert!(!has_english_chars("こんにちは"));
}

#[test]
fn test_language_display_name_withShortCodes_shouldNameLanguages() {
    assert_eq!(language_display_name("jp"), "Japanese");
    assert_eq!(language_display_name("kor"), "Korean");
    assert_eq!(language_display_name("en"), "English");
}

#[test]
fn test_language_display_name_withUnknownCode_shouldEchoCode() {
    assert_eq!(language_display_name("xx"), "xx");
}
