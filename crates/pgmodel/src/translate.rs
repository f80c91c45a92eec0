//! Half-width to full-width TRANSLATE chains for `h2f_like` / `h2f_ilike`.
//!
//! Japanese data is commonly stored full-width while user queries arrive
//! half-width. Wrapping both sides of a LIKE in the same TRANSLATE chain
//! canonicalizes them to full-width, so `ｱ` matches stored `ア`.
//!
//! The chain is emitted in a fixed class order (digits, Latin letters, kana)
//! so the generated SQL is deterministic.

const DIGITS_HALF: &str = "0123456789";
const DIGITS_FULL: &str = "０１２３４５６７８９";

const LATIN_HALF: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const LATIN_FULL: &str =
    "ＡＢＣＤＥＦＧＨＩＪＫＬＭＮＯＰＱＲＳＴＵＶＷＸＹＺａｂｃｄｅｆｇｈｉｊｋｌｍｎｏｐｑｒｓｔｕｖｗｘｙｚ";

// U+FF66..U+FF9F. Voiced/semi-voiced marks map to the standalone combining
// characters; TRANSLATE is strictly one-to-one.
const KANA_HALF: &str = "ｦｧｨｩｪｫｬｭｮｯｰｱｲｳｴｵｶｷｸｹｺｻｼｽｾｿﾀﾁﾂﾃﾄﾅﾆﾇﾈﾉﾊﾋﾌﾍﾎﾏﾐﾑﾒﾓﾔﾕﾖﾗﾘﾙﾚﾛﾜﾝﾞﾟ";
const KANA_FULL: &str =
    "ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン゛゜";

const CLASSES: [(&str, &str); 3] = [
    (DIGITS_HALF, DIGITS_FULL),
    (LATIN_HALF, LATIN_FULL),
    (KANA_HALF, KANA_FULL),
];

/// Wrap a SQL expression in the deterministic TRANSLATE chain.
pub(crate) fn translate_chain(expr: &str) -> String {
    let mut out = expr.to_string();
    for (from, to) in CLASSES {
        out = format!("TRANSLATE({out}, '{from}', '{to}')");
    }
    out
}
