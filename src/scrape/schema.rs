// Declarative extraction schema for storefront detail pages.
//
// Every CSS selector the extractor depends on lives in one table so a
// storefront markup change is a one-line edit here, not a hunt through
// page-evaluation code. Variant discrimination over the raw node data
// (free / flat price / discounted) is a pure function and unit-tested.

use serde::Deserialize;

use super::{PriceField, PurchaseOption, ScrapeError};

/// Selector table for one storefront's detail-page template.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSchema {
    /// Page title node.
    pub title: &'static str,
    /// Header/cover image node.
    pub header_image: &'static str,
    /// Container that holds all purchase sections.
    pub purchase_root: &'static str,
    /// One purchase option node.
    pub purchase_node: &'static str,
    /// Purchase node variant to exclude (bundle/subscription dropdowns).
    pub purchase_exclude: &'static str,
    /// Option title inside a purchase node.
    pub option_title: &'static str,
    /// Price container inside a purchase node; its child structure
    /// discriminates the variant.
    pub action_bg: &'static str,
    /// Struck-through price inside discount markup.
    pub discount_original: &'static str,
    /// Discounted price inside discount markup.
    pub discount_final: &'static str,
    /// Discount percentage inside discount markup.
    pub discount_pct: &'static str,
}

pub const STEAM: ExtractionSchema = ExtractionSchema {
    title: "div#appHubAppName.apphub_AppName",
    header_image: "img.game_header_image_full",
    purchase_root: ".game_description_column",
    purchase_node: ".game_area_purchase_game",
    purchase_exclude: ".game_area_purchase_game_dropdown_subscription",
    option_title: "h1",
    action_bg: ".game_purchase_action_bg",
    discount_original: ".discount_original_price",
    discount_final: ".discount_final_price",
    discount_pct: ".discount_pct",
};

/// What the in-page script reports for the whole page.
#[derive(Debug, Deserialize)]
pub struct RawPage {
    pub title: String,
    pub image: String,
    /// One entry per non-excluded purchase node, in DOM order. `None` marks a
    /// node whose price container was missing.
    pub options: Vec<Option<RawOption>>,
}

/// What the in-page script reports for one purchase node. Only structure and
/// text; all interpretation happens in [`classify`].
#[derive(Debug, Deserialize)]
pub struct RawOption {
    #[serde(default)]
    pub title: String,
    pub action_children: u32,
    pub nested_children: u32,
    #[serde(default)]
    pub flat_text: Option<String>,
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub final_price: Option<String>,
    #[serde(default)]
    pub pct: Option<String>,
}

/// Render the page-side collection script for a schema. The script only
/// gathers structure and text; returns `null` when the page does not match
/// the detail-page template at all.
pub fn build_collect_script(schema: &ExtractionSchema) -> String {
    format!(
        r#"(() => {{
            const text = (el, sel) => {{
                const n = el.querySelector(sel);
                return n ? n.innerText : null;
            }};
            const title = document.querySelector("{title}");
            const image = document.querySelector("{image}");
            const root = document.querySelector("{root}");
            if (!title || !image || !root) return null;
            const nodes = Array.from(root.querySelectorAll("{node}:not({exclude})"));
            const options = nodes.map((node) => {{
                const heading = node.querySelector("{heading}");
                const action = node.querySelector("{action}");
                if (!action) return null;
                const first = action.children.length > 0 ? action.children[0] : null;
                return {{
                    title: heading ? heading.innerHTML : "",
                    action_children: action.childElementCount,
                    nested_children: first ? first.childElementCount : 0,
                    flat_text: first ? first.innerText : null,
                    original: first ? text(first, "{orig}") : null,
                    final_price: first ? text(first, "{fin}") : null,
                    pct: first ? text(first, "{pct}") : null,
                }};
            }});
            return {{ title: title.innerText, image: image.src, options }};
        }})()"#,
        title = schema.title,
        image = schema.header_image,
        root = schema.purchase_root,
        node = schema.purchase_node,
        exclude = schema.purchase_exclude,
        heading = schema.option_title,
        action = schema.action_bg,
        orig = schema.discount_original,
        fin = schema.discount_final,
        pct = schema.discount_pct,
    )
}

/// Turn one raw purchase node into a `PurchaseOption`.
///
/// Variants, in priority order on the price container's child count:
/// single child = free, multiple children without nested markup = flat
/// price, nested markup present = discounted.
pub fn classify(raw: &RawOption) -> Result<PurchaseOption, ScrapeError> {
    if raw.action_children == 0 {
        return Err(ScrapeError::SelectorMiss("game_purchase_action_bg children"));
    }
    if raw.action_children == 1 {
        return Ok(PurchaseOption {
            title: raw.title.clone(),
            original: "Free".to_string(),
            final_price: PriceField::Number(0),
            discount: PriceField::Number(0),
        });
    }
    if raw.nested_children == 0 {
        let original = raw
            .flat_text
            .clone()
            .ok_or(ScrapeError::SelectorMiss("price text"))?;
        return Ok(PurchaseOption {
            title: raw.title.clone(),
            original,
            final_price: PriceField::Number(0),
            discount: PriceField::Number(0),
        });
    }
    let original = raw
        .original
        .clone()
        .ok_or(ScrapeError::SelectorMiss("discount_original_price"))?;
    let final_price = raw
        .final_price
        .clone()
        .ok_or(ScrapeError::SelectorMiss("discount_final_price"))?;
    let pct = raw
        .pct
        .clone()
        .ok_or(ScrapeError::SelectorMiss("discount_pct"))?;
    Ok(PurchaseOption {
        title: raw.title.clone(),
        original,
        final_price: PriceField::Text(final_price),
        discount: PriceField::Text(pct),
    })
}

/// Parse a price text like "$19.99", "19,99€" or "CDN$ 25.99" into minor
/// units by keeping the digits. Good enough for ordering comparisons; not a
/// currency parser.
pub fn parse_minor_units(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
