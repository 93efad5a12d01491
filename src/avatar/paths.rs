//! Asset path resolution
//!
//! Maps a [`ResourceIdentity`] onto the fixed asset-tree layout. The tree
//! predates this crate and is irregular: each category carries its own
//! body-type alias table, a handful of styles live in body-independent
//! `adult` folders, some species substitute another species' artwork, and a
//! few wing styles ship one sheet shared by both wing plates. All of that is
//! encoded here as static lookup tables so it can be audited in one place.
//!
//! Resolution is total. An identity the tables do not cover still produces a
//! best-guess path and a warning, never an error.

use crate::assets::{Category, ResourceIdentity};
use crate::avatar::configuration::BodyType;
use tracing::warn;

/// Hair styles that always resolve under the body-independent `adult` folder.
const ADULT_ONLY_HAIR: &[&str] = &["afro", "bob", "buzzcut", "mohawk", "topknot"];

/// Hair styles that ship a separate back plate drawn behind the body.
const HAIR_WITH_BACK: &[&str] = &[
    "long_straight",
    "braid",
    "ponytail",
    "twin_tails",
    "curly_long",
];

/// Species with per-body-type head folders; all others are flat `adult`.
const BODY_KEYED_SPECIES: &[&str] = &["wolf", "lizard", "orc"];

/// Species with no authored head of their own. They reuse the closest
/// available creature. Asset-availability workarounds, reproduced exactly.
const SPECIES_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("fox", "wolf"),
    ("hyena", "wolf"),
    ("gecko", "lizard"),
    ("goblin", "orc"),
    ("mole", "rat"),
];

/// Tail styles reusing another style's sheet.
const TAIL_SUBSTITUTIONS: &[(&str, &str)] = &[("fox", "wolf"), ("gecko", "lizard")];

const FORMAL_HATS: &[&str] = &["tophat", "bowler", "boater"];
const CLOTH_HATS: &[&str] = &["bandana", "hood", "beret", "sunhat"];
const HELMETS: &[&str] = &["legion", "norman", "spangenhelm", "barbarian", "kettle"];
/// Helmets authored per sex; the rest of the helmet family is flat `adult`.
const BODY_KEYED_HELMETS: &[&str] = &["legion", "norman"];

/// Wing styles shipping a single sheet reused for both wing plates.
const SINGLE_SHEET_WINGS: &[&str] = &["pixie", "dragonfly"];

/// Color names containing an internal separator. Composite-key splitting
/// tests these before falling back to the final single token.
const MULTI_WORD_COLORS: &[&str] = &[
    "dark_brown",
    "light_brown",
    "ash_blonde",
    "strawberry_blonde",
    "dark_gray",
    "light_gray",
    "royal_blue",
    "navy_blue",
    "forest_green",
    "blood_red",
];

// Per-category body-fit alias tables. These genuinely differ per category
// (teen shoes are `female` while teen tops are `thin`); the table for each
// category is authoritative, never a shared default.

fn body_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Male => "male",
        BodyType::Female => "female",
        BodyType::Muscular => "muscular",
        BodyType::Pregnant => "pregnant",
        BodyType::Teen => "teen",
        BodyType::Child => "child",
    }
}

fn head_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Male | BodyType::Muscular => "male",
        BodyType::Female | BodyType::Pregnant | BodyType::Teen => "female",
        BodyType::Child => "child",
    }
}

fn eyes_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Child => "child",
        _ => "adult",
    }
}

fn hair_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Male | BodyType::Muscular => "male",
        BodyType::Female | BodyType::Pregnant | BodyType::Teen => "female",
        BodyType::Child => "child",
    }
}

fn top_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Male => "male",
        BodyType::Female => "female",
        BodyType::Muscular => "muscular",
        BodyType::Pregnant => "pregnant",
        BodyType::Teen => "thin",
        BodyType::Child => "child",
    }
}

fn bottom_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Male | BodyType::Muscular => "male",
        BodyType::Female => "female",
        BodyType::Pregnant => "pregnant",
        BodyType::Teen => "thin",
        BodyType::Child => "child",
    }
}

fn shoe_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Male | BodyType::Muscular => "male",
        BodyType::Female | BodyType::Pregnant | BodyType::Teen => "female",
        BodyType::Child => "child",
    }
}

fn cloth_hat_fit(body: BodyType) -> &'static str {
    match body {
        BodyType::Male | BodyType::Muscular => "male",
        BodyType::Female | BodyType::Pregnant | BodyType::Teen => "female",
        BodyType::Child => "child",
    }
}

fn helmet_sex(body: BodyType) -> &'static str {
    match body {
        BodyType::Male | BodyType::Muscular | BodyType::Child => "male",
        BodyType::Female | BodyType::Pregnant | BodyType::Teen => "female",
    }
}

fn substitute<'a>(token: &'a str, table: &[(&str, &'a str)]) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == token)
        .map(|(_, to)| *to)
        .unwrap_or(token)
}

pub(crate) fn hair_has_back_layer(style: &str) -> bool {
    HAIR_WITH_BACK.contains(&style)
}

pub(crate) fn hair_is_adult_only(style: &str) -> bool {
    ADULT_ONLY_HAIR.contains(&style)
}

/// Whether this hat item resolves through a body-dependent folder.
pub(crate) fn hat_varies_by_body(item: &str) -> bool {
    if FORMAL_HATS.contains(&item) {
        return false;
    }
    if HELMETS.contains(&item) {
        return BODY_KEYED_HELMETS.contains(&item);
    }
    // Cloth hats and unknown items fall through to the cloth pattern.
    true
}

pub(crate) fn wings_share_single_sheet(style: &str) -> bool {
    SINGLE_SHEET_WINGS.contains(&style)
}

fn style_token(identity: &ResourceIdentity) -> &str {
    match identity.variants.first() {
        Some(token) => token.as_str(),
        None => {
            warn!(category = %identity.category, "identity has no variant token, resolving as 'unknown'");
            "unknown"
        }
    }
}

fn color_token<'a>(identity: &'a ResourceIdentity, default: &'a str) -> &'a str {
    identity.color.as_deref().unwrap_or(default)
}

/// Resolve an identity to its relative path under the asset root.
///
/// Pure and total; the same identity always yields the same path, and no
/// input produces an error. Categories without a dedicated rule get the
/// best-guess default pattern with a warning.
pub fn resolve(identity: &ResourceIdentity) -> String {
    let body = identity.body.unwrap_or_default();
    match &identity.category {
        Category::Body => {
            let skin = color_token(identity, "light");
            format!("bodies/{}/{}.png", body_fit(body), skin)
        }
        Category::Head => {
            let species = substitute(style_token(identity), SPECIES_SUBSTITUTIONS);
            let skin = color_token(identity, "light");
            if BODY_KEYED_SPECIES.contains(&species) {
                format!("heads/{}/{}/{}.png", species, head_fit(body), skin)
            } else {
                format!("heads/{species}/adult/{skin}.png")
            }
        }
        Category::Eyes => {
            let color = color_token(identity, "blue");
            format!("eyes/{}/{}.png", eyes_fit(body), color)
        }
        Category::Hair | Category::HairBack => {
            let style = style_token(identity);
            let fit = if hair_is_adult_only(style) {
                "adult"
            } else {
                hair_fit(body)
            };
            let plate = if identity.category == Category::HairBack {
                "back"
            } else {
                "base"
            };
            format!("hair/{style}/{fit}/{plate}.png")
        }
        Category::Beard => {
            let style = style_token(identity);
            let color = color_token(identity, "brown");
            format!("beards/{style}/male/{color}.png")
        }
        Category::Top => {
            format!("torso/{}/{}/base.png", style_token(identity), top_fit(body))
        }
        Category::Bottom => {
            format!(
                "legs/{}/{}/base.png",
                style_token(identity),
                bottom_fit(body)
            )
        }
        Category::Shoes => {
            format!("feet/{}/{}/base.png", style_token(identity), shoe_fit(body))
        }
        Category::Hat => {
            let item = style_token(identity);
            let color = color_token(identity, "black");
            if FORMAL_HATS.contains(&item) {
                format!("hats/formal/{item}/adult/{color}.png")
            } else if CLOTH_HATS.contains(&item) {
                format!("hats/cloth/{}/{}/{}.png", item, cloth_hat_fit(body), color)
            } else if HELMETS.contains(&item) {
                if BODY_KEYED_HELMETS.contains(&item) {
                    format!("hats/helmet/{}/{}/{}.png", item, helmet_sex(body), color)
                } else {
                    format!("hats/helmet/{item}/adult/{color}.png")
                }
            } else {
                warn!(item, "hat item not in any sub-family table, assuming cloth layout");
                format!("hats/cloth/{}/{}/{}.png", item, cloth_hat_fit(body), color)
            }
        }
        Category::Glasses => {
            let color = color_token(identity, "black");
            format!("glasses/{}/adult/{}.png", style_token(identity), color)
        }
        Category::WingsBackground | Category::WingsForeground => {
            let style = style_token(identity);
            if wings_share_single_sheet(style) {
                format!("wings/{style}/wings.png")
            } else if identity.category == Category::WingsBackground {
                format!("wings/{style}/background.png")
            } else {
                format!("wings/{style}/foreground.png")
            }
        }
        Category::Tail => {
            let style = substitute(style_token(identity), TAIL_SUBSTITUTIONS);
            format!("tails/{style}/tail.png")
        }
        Category::Horns => {
            format!("horns/{}/horns.png", style_token(identity))
        }
        Category::Ears => {
            format!("ears/{}/ears.png", style_token(identity))
        }
        Category::Accessory => {
            let color = color_token(identity, "base");
            format!(
                "accessories/{}/adult/{}.png",
                style_token(identity),
                color
            )
        }
        Category::Custom(name) => {
            warn!(
                category = name.as_str(),
                "no resolver rule for category, using default pattern"
            );
            let fit = match identity.body {
                Some(body) => body_fit(body),
                None => "adult",
            };
            let color = color_token(identity, "base");
            let mut path = name.clone();
            for token in &identity.variants {
                path.push('/');
                path.push_str(token);
            }
            format!("{path}/{fit}/{color}.png")
        }
    }
}

/// Split a legacy composite `{style}_{color}` key.
///
/// Both style and color names may contain `_`, so the last two tokens are
/// tested against the multi-word color table first; only when they do not
/// match is the final single token taken as the color. A key with no
/// separator is all style, no color.
pub fn split_style_color(key: &str) -> (String, Option<String>) {
    let tokens: Vec<&str> = key.split('_').collect();
    if tokens.len() < 2 {
        return (key.to_string(), None);
    }
    let tail_pair = format!(
        "{}_{}",
        tokens[tokens.len() - 2],
        tokens[tokens.len() - 1]
    );
    if MULTI_WORD_COLORS.contains(&tail_pair.as_str()) {
        let style = tokens[..tokens.len() - 2].join("_");
        return (style, Some(tail_pair));
    }
    let style = tokens[..tokens.len() - 1].join("_");
    (style, Some(tokens[tokens.len() - 1].to_string()))
}
