//! Integration tests for inline micro-codes

use diceling_parser::{CqCode, cq_codes, cq_rewrite, image_rewrite, strip_cq_kind};

#[test]
fn rewrite_changes_codes_in_place() {
    let text = "[CQ:at,qq=1] rolled [CQ:image,file=a.png] and [CQ:face,id=14]";
    let out = cq_rewrite(text, |code| match code.kind.as_str() {
        "at" => code.overwrite = Some("@Alice".to_string()),
        "image" => code.set_arg("file", "cache/a-large-name.png"),
        _ => {}
    });
    assert_eq!(
        out,
        "@Alice rolled [CQ:image,file=cache/a-large-name.png] and [CQ:face,id=14]"
    );
}

#[test]
fn longer_replacements_do_not_shift_later_matches() {
    let text = "[img:a.png][图:b.png] end";
    let out = image_rewrite(text, |code| {
        let path = code
            .split_once(':')
            .map_or("", |(_, rest)| rest.trim_end_matches(']'));
        CqCode {
            kind: "image".to_string(),
            args: vec![("file".to_string(), format!("file:///{path}"))],
            overwrite: None,
        }
        .to_string()
    });
    assert_eq!(
        out,
        "[CQ:image,file=file:///a.png][CQ:image,file=file:///b.png] end"
    );
}

#[test]
fn strip_only_the_named_kind() {
    let text = "[CQ:reply,id=3]see [CQ:at,qq=2][CQ:reply,id=4]";
    assert_eq!(strip_cq_kind(text, "reply"), "see [CQ:at,qq=2]");
}

#[test]
fn codes_listed_in_order() {
    let kinds: Vec<String> = cq_codes("x[CQ:at,qq=1]y[CQ:record,file=v.amr]z[CQ:shake]")
        .into_iter()
        .map(|code| code.kind)
        .collect();
    assert_eq!(kinds, vec!["at", "record", "shake"]);
}

#[test]
fn parse_and_compile_round_trip_keeps_argument_order() {
    let code = CqCode::parse("[CQ:image,type=show,file=1.png]");
    assert_eq!(code.compile(), "[CQ:image,type=show,file=1.png]");
}
