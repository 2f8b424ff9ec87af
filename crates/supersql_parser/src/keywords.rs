/// Try to get a keyword from a string, ignoring string casing.
pub fn keyword_from_str(s: &str) -> Option<Keyword> {
    let s = unicase::Ascii::new(s);
    let idx = KEYWORD_STRINGS.binary_search(&s).ok()?;
    Some(ALL_KEYWORDS[idx])
}

/// Generate an enum of keywords.
///
/// Keywords must be listed in sorted order.
macro_rules! define_keywords {
    ($($ident:ident),*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($ident),*
        }

        pub const ALL_KEYWORDS: &[Keyword] = &[
            $(Keyword::$ident),*
        ];

        pub const KEYWORD_STRINGS: &[unicase::Ascii<&str>] = &[
            $(unicase::Ascii::new(stringify!($ident)),)*
        ];
    };
}

// Reserved words. None of these may be used as bare identifiers.
#[rustfmt::skip]
define_keywords!(
    AND,
    AS,
    ASC,
    BETWEEN,
    BY,
    CROSS,
    DELETE,
    DESC,
    FALSE,
    FROM,
    GROUP,
    HAVING,
    IN,
    INNER,
    INSERT,
    INTO,
    IS,
    JOIN,
    LEFT,
    LIMIT,
    NOT,
    NULL,
    OFFSET,
    ON,
    OR,
    ORDER,
    OUTER,
    RIGHT,
    SELECT,
    SET,
    SHOW,
    TABLE,
    TRUE,
    TRUNCATE,
    UPDATE,
    VALUES,
    WHERE
);
