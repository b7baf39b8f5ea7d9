//! Integration tests for platform mention markup

use diceling_parser::{Mention, extract_mentions, mention_pattern};

#[test]
fn each_platform_reads_its_own_markup() {
    let cases = [
        ("QQ", "[CQ:at,qq=10001] hi", "10001"),
        ("KOOK", "(met)2233(met) hi", "2233"),
        ("Discord", "<@!998877> hi", "998877"),
        ("Dodo", "<@!5150> hi", "5150"),
        ("Slack", "<@U02ABC> hi", "U02ABC"),
        ("SATORI", r#"<at id="u-1"/> hi"#, "u-1"),
        ("TG", "tg://user?id=31337 hi", "31337"),
    ];
    for (platform, text, id) in cases {
        let (rest, mentions) = extract_mentions(text, platform);
        assert_eq!(rest.trim(), "hi", "{platform}");
        assert_eq!(mentions, vec![Mention::new(platform, id)], "{platform}");
    }
}

#[test]
fn foreign_markup_is_left_alone() {
    let text = "<@!42> [CQ:at,qq=7]";
    let (rest, mentions) = extract_mentions(text, "QQ");
    assert_eq!(rest, "<@!42> ");
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].to_string(), "QQ:7");
}

#[test]
fn unknown_platform_uses_cq_codes() {
    assert_eq!(mention_pattern("Matrix").as_str(), mention_pattern("QQ").as_str());
    assert_eq!(mention_pattern("kook").as_str(), mention_pattern("KOOK").as_str());
}

#[test]
fn mention_parts() {
    let mention = Mention::new("QQ", "123");
    assert_eq!(mention.as_str(), "QQ:123");
    assert_eq!(mention.platform(), "QQ");
    assert_eq!(mention.user_id(), "123");
}
