use sea_orm::{
    ColumnTrait,
    sea_query::{Expr, LikeExpr, SimpleExpr},
};

const LIKE_ESCAPE: char = '\\';

/// Search key for a piece of text: Unicode lowercase, with full-width ASCII
/// forms and the ideographic space mapped to their half-width equivalents.
///
/// Written next to the original column on insert, because SQLite's `LOWER`
/// only folds ASCII.
pub fn fold(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Literal substring match of `needle` against a column holding [`fold`]ed
/// text. `%`, `_` and `\` in the needle match only themselves.
pub fn folded_contains<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    let mut pattern = String::from("%");
    for c in fold(needle).chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');

    Expr::col(col).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_beyond_ascii() {
        assert_eq!(fold("ÉCOLE"), "école");
        assert_eq!(fold("Straße"), "straße");
    }

    #[test]
    fn folds_full_width_forms() {
        assert_eq!(fold("Ｔｏｋｙｏ　Story"), "tokyo story");
        assert_eq!(fold("ＴＯＫＹＯ"), "tokyo");
        assert_eq!(fold("１００％"), "100%");
    }

    #[test]
    fn leaves_kana_and_kanji_alone() {
        assert_eq!(fold(" 新宿バルト9 "), "新宿バルト9");
    }
}
