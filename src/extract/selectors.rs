//! Compiled CSS selectors and patterns, grouped per field in priority order.

use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

fn compile(list: &[&'static str]) -> Vec<(&'static str, Selector)> {
    list.iter()
        .map(|css| (*css, Selector::parse(css).expect("valid selector")))
        .collect()
}

fn one(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid regex")
}

// Containers

pub static OFFER_CONTAINERS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        "div.article-row",
        r#"div[class*="article"]"#,
        "tr.article",
        "div.row.no-gutters.article",
        ".table-body .row",
    ])
});

/// A euro amount, thousands groups included: `2,50`, `1.234,56`, `1,234.56`.
const AMOUNT: &str = r"\d{1,3}(?:[.,]\d{3})+[.,]\d{2}|\d+[.,]\d{2}";

/// A currency amount in a text node, used to locate containers by content.
pub static AMOUNT_TEXT: LazyLock<Regex> = LazyLock::new(|| pattern(&format!(r"(?:{AMOUNT})\s*€")));

/// Block-level elements a fallback container may be.
pub const BLOCK_TAGS: [&str; 3] = ["div", "tr", "li"];

// Prices

pub static PRICE: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        ".price-container .font-weight-bold",
        ".price-container span",
        r#"[class*="price"] .font-weight-bold"#,
        "span.font-weight-bold",
        ".color-primary",
        r#"[data-original-title*="price"]"#,
    ])
});

pub static PRICE_TEXT: LazyLock<Regex> = LazyLock::new(|| pattern(&format!(r"({AMOUNT})\s*€")));

pub static SHIPPING: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        ".shipping-price",
        r#"[class*="shipping"]"#,
        r#"span[title*="Versand"]"#,
        r#"span[title*="shipping"]"#,
    ])
});

pub static SHIPPING_TEXT: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"\+\s*({AMOUNT})\s*€")));

pub static QUANTITY: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        ".amount-container span",
        r#"[class*="quantity"]"#,
        r#"[class*="amount"]"#,
        r#"input[name="amount"]"#,
    ])
});

// Item attributes

pub static CONDITION: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        "a[data-original-title]",
        "span[data-original-title]",
        ".product-attributes span",
        r#"[class*="condition"]"#,
    ])
});

pub static CONDITION_CLASS: LazyLock<Selector> =
    LazyLock::new(|| one(r#"[class*="condition"]"#));

/// Condition names (any case) or upper-case codes as whole words.
pub static CONDITION_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i:\b(?:lightly played|light played|near mint|excellent|played|good|poor|mint)\b)|\b(?:MT|NM|EX|GD|LP|PL|PO)\b",
    )
});

pub static LANGUAGE: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        r#"span[data-original-title*="Language"]"#,
        r#"[data-original-title*="Sprache"]"#,
        r#"[class*="language"]"#,
        r#"img[src*="flag"][alt]"#,
    ])
});

pub static FOIL_MARKER: LazyLock<Selector> =
    LazyLock::new(|| one(r#"[class*="foil"], [data-original-title*="Foil"]"#));

/// Foil wording as a whole word. Group 1 catches a `non-` prefix.
pub static FOIL_WORD: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\b(non[-\s]?)?(?:foil|holo(?:graphic)?)\b"));

// Seller

pub static SELLER_LINK: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        r#"a[href*="/Users/"]"#,
        ".seller-name a",
        r#"[class*="seller"] a"#,
    ])
});

pub static SELLER_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"/Users/([^/?#]+)"));

pub static SELLER_RATING: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        r#"span[class*="seller-rating"]"#,
        r#"[class*="rating"]"#,
        r#"span[title*="%"]"#,
    ])
});

pub static SELLER_SALES: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        r#"[class*="sell-count"]"#,
        r#"span[title*="sales"]"#,
        r#"span[title*="Verkäufe"]"#,
    ])
});

pub static SELLER_COUNTRY: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        r#"span[class*="flag-icon"]"#,
        r#"img[src*="flag"]"#,
        r#"[data-original-title*="Country"]"#,
    ])
});

pub static COUNTRY_CODE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"flag-icon-([A-Za-z]{2})\b|/([A-Za-z]{2})\.(?:png|svg|gif|jpe?g)"));

// Article

pub static ARTICLE_LINK: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    compile(&[
        r#"a[href*="/Article/"]"#,
        r#"a[href*="/article/"]"#,
        "a.article-link",
    ])
});

pub static ARTICLE_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)/Article/(\d+)"));

pub const ARTICLE_ID_ATTRS: [&str; 2] = ["data-article-id", "data-id"];

// Flags

pub static PROFESSIONAL: LazyLock<Selector> =
    LazyLock::new(|| one(r#"[class*="professional"], [title*="Professional"]"#));

pub static POWERSELLER: LazyLock<Selector> =
    LazyLock::new(|| one(r#"[class*="powerseller"], [title*="Powerseller"]"#));

pub static ON_VACATION: LazyLock<Selector> =
    LazyLock::new(|| one(r#"[class*="vacation"], [title*="Vacation"]"#));

// Document level

pub static OG_URL: LazyLock<Selector> = LazyLock::new(|| one(r#"meta[property="og:url"]"#));

pub static CANONICAL: LazyLock<Selector> = LazyLock::new(|| one(r#"link[rel="canonical"]"#));

pub static PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"/Products/(\d+)"));
