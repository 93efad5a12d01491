//! Layer expansion
//!
//! Turns an [`AvatarConfiguration`] into the ordered draw list the compositor
//! consumes. Ordering comes from a single fixed z-order table; selections
//! whose field equals the category sentinel contribute nothing. Tints are
//! resolved here from the named-color table so the compositor itself stays
//! table-free.

use crate::assets::{Category, ResourceIdentity};
use crate::avatar::configuration::{AvatarConfiguration, SENTINEL_NONE};
use crate::avatar::paths;
use tracing::warn;

/// Multiplicative tint as linear 8-bit RGB.
pub type Tint = [u8; 3];

/// Draw slots, named for what occupies them.
///
/// Front hair owns two slots: it normally draws right below the beard, but a
/// creature head raises it above horns and ears so those features poke
/// through correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerName {
    Body,
    HeadOverlay,
    Eyes,
    Bottom,
    Shoes,
    Top,
    HairBack,
    HairFront,
    Beard,
    WingsBackground,
    Tail,
    Horns,
    Ears,
    HairFrontRaised,
    Hat,
    Glasses,
    WingsForeground,
    Accessory,
}

/// Bottom-to-top draw order. Configuration-independent.
pub const Z_ORDER: &[LayerName] = &[
    LayerName::Body,
    LayerName::HeadOverlay,
    LayerName::Eyes,
    LayerName::Bottom,
    LayerName::Shoes,
    LayerName::Top,
    LayerName::HairBack,
    LayerName::HairFront,
    LayerName::Beard,
    LayerName::WingsBackground,
    LayerName::Tail,
    LayerName::Horns,
    LayerName::Ears,
    LayerName::HairFrontRaised,
    LayerName::Hat,
    LayerName::Glasses,
    LayerName::WingsForeground,
    LayerName::Accessory,
];

/// Named tint colors for the recolorable categories.
const TINT_COLORS: &[(&str, Tint)] = &[
    ("white", [255, 255, 255]),
    ("black", [46, 46, 46]),
    ("gray", [150, 150, 150]),
    ("light_gray", [200, 200, 200]),
    ("dark_gray", [105, 105, 105]),
    ("raven", [20, 24, 34]),
    ("blonde", [240, 218, 133]),
    ("ash_blonde", [222, 210, 176]),
    ("strawberry_blonde", [255, 203, 164]),
    ("ginger", [221, 110, 47]),
    ("brown", [139, 90, 43]),
    ("dark_brown", [74, 47, 27]),
    ("light_brown", [181, 134, 84]),
    ("red", [200, 38, 38]),
    ("blood_red", [136, 8, 8]),
    ("orange", [236, 136, 36]),
    ("gold", [212, 175, 55]),
    ("green", [70, 160, 73]),
    ("forest_green", [34, 85, 51]),
    ("teal", [54, 160, 160]),
    ("blue", [66, 106, 216]),
    ("royal_blue", [65, 105, 225]),
    ("navy_blue", [30, 48, 102]),
    ("purple", [128, 70, 180]),
    ("lavender", [181, 157, 226]),
    ("pink", [238, 130, 188]),
    ("silver", [192, 192, 192]),
];

/// Look up a named tint. Unknown names draw untinted with a warning; a bad
/// color selection must never sink a composition.
pub fn tint_for(name: &str) -> Option<Tint> {
    let found = TINT_COLORS
        .iter()
        .find(|(tint_name, _)| *tint_name == name)
        .map(|(_, rgb)| *rgb);
    if found.is_none() {
        warn!(color = name, "unknown tint color, layer will draw untinted");
    }
    found
}

/// One entry of the draw list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: LayerName,
    pub identity: ResourceIdentity,
    /// Multiplicative recolor for neutral-base artwork; `None` draws as
    /// authored.
    pub tint: Option<Tint>,
}

impl Layer {
    fn plain(name: LayerName, identity: ResourceIdentity) -> Self {
        Self {
            name,
            identity,
            tint: None,
        }
    }

    fn tinted(name: LayerName, identity: ResourceIdentity, color: &str) -> Self {
        Self {
            name,
            identity,
            tint: tint_for(color),
        }
    }
}

/// Expand a configuration into its ordered draw list.
///
/// Walks [`Z_ORDER`] slot by slot, so the output is sorted by construction.
/// Accessories keep their configuration list order within the topmost slot.
pub fn build_layers(config: &AvatarConfiguration) -> Vec<Layer> {
    let body = config.body.body_type;
    let creature = config.head.is_creature();
    let mut layers = Vec::new();

    for slot in Z_ORDER {
        match slot {
            LayerName::Body => {
                layers.push(Layer::plain(
                    LayerName::Body,
                    ResourceIdentity::bare(Category::Body)
                        .with_color(config.body.skin.clone())
                        .with_body(body),
                ));
            }
            LayerName::HeadOverlay => {
                if creature {
                    layers.push(Layer::plain(
                        LayerName::HeadOverlay,
                        ResourceIdentity::new(Category::Head, config.head.species.clone())
                            .with_color(config.body.skin.clone())
                            .with_body(body),
                    ));
                }
            }
            LayerName::Eyes => {
                // Creature heads are authored with their own eyes.
                if !creature {
                    layers.push(Layer::plain(
                        LayerName::Eyes,
                        ResourceIdentity::bare(Category::Eyes)
                            .with_color(config.eyes.color.clone())
                            .with_body(body),
                    ));
                }
            }
            LayerName::Bottom => {
                if config.clothing.bottom != SENTINEL_NONE {
                    layers.push(Layer::tinted(
                        LayerName::Bottom,
                        ResourceIdentity::new(Category::Bottom, config.clothing.bottom.clone())
                            .with_body(body),
                        &config.clothing.bottom_color,
                    ));
                }
            }
            LayerName::Shoes => {
                if config.clothing.shoes != SENTINEL_NONE {
                    layers.push(Layer::tinted(
                        LayerName::Shoes,
                        ResourceIdentity::new(Category::Shoes, config.clothing.shoes.clone())
                            .with_body(body),
                        &config.clothing.shoes_color,
                    ));
                }
            }
            LayerName::Top => {
                if config.clothing.top != SENTINEL_NONE {
                    layers.push(Layer::tinted(
                        LayerName::Top,
                        ResourceIdentity::new(Category::Top, config.clothing.top.clone())
                            .with_body(body),
                        &config.clothing.top_color,
                    ));
                }
            }
            LayerName::HairBack => {
                if config.hair.enabled() && paths::hair_has_back_layer(&config.hair.style) {
                    layers.push(Layer::tinted(
                        LayerName::HairBack,
                        hair_identity(Category::HairBack, config),
                        &config.hair.color,
                    ));
                }
            }
            LayerName::HairFront => {
                if config.hair.enabled() && !creature {
                    layers.push(Layer::tinted(
                        LayerName::HairFront,
                        hair_identity(Category::Hair, config),
                        &config.hair.color,
                    ));
                }
            }
            LayerName::Beard => {
                if config.beard.enabled() {
                    layers.push(Layer::plain(
                        LayerName::Beard,
                        ResourceIdentity::new(Category::Beard, config.beard.style.clone())
                            .with_color(config.beard.color.clone()),
                    ));
                }
            }
            LayerName::WingsBackground => {
                if config.wings.enabled() {
                    layers.push(wing_layer(LayerName::WingsBackground, config));
                }
            }
            LayerName::Tail => {
                if config.tail.enabled() {
                    let mut layer = Layer::plain(
                        LayerName::Tail,
                        ResourceIdentity::new(Category::Tail, config.tail.style.clone()),
                    );
                    if let Some(color) = &config.tail.color {
                        layer.tint = tint_for(color);
                    }
                    layers.push(layer);
                }
            }
            LayerName::Horns => {
                if config.horns.enabled() {
                    let mut layer = Layer::plain(
                        LayerName::Horns,
                        ResourceIdentity::new(Category::Horns, config.horns.style.clone()),
                    );
                    if let Some(color) = &config.horns.color {
                        layer.tint = tint_for(color);
                    }
                    layers.push(layer);
                }
            }
            LayerName::Ears => {
                if config.ears.enabled() {
                    let mut layer = Layer::plain(
                        LayerName::Ears,
                        ResourceIdentity::new(Category::Ears, config.ears.style.clone()),
                    );
                    if let Some(color) = &config.ears.color {
                        layer.tint = tint_for(color);
                    }
                    layers.push(layer);
                }
            }
            LayerName::HairFrontRaised => {
                if config.hair.enabled() && creature {
                    layers.push(Layer::tinted(
                        LayerName::HairFrontRaised,
                        hair_identity(Category::Hair, config),
                        &config.hair.color,
                    ));
                }
            }
            LayerName::Hat => {
                if config.hat.enabled() {
                    let mut identity =
                        ResourceIdentity::new(Category::Hat, config.hat.style.clone());
                    if let Some(color) = &config.hat.color {
                        identity = identity.with_color(color.clone());
                    }
                    if paths::hat_varies_by_body(&config.hat.style) {
                        identity = identity.with_body(body);
                    }
                    layers.push(Layer::plain(LayerName::Hat, identity));
                }
            }
            LayerName::Glasses => {
                if config.glasses.enabled() {
                    let mut identity =
                        ResourceIdentity::new(Category::Glasses, config.glasses.style.clone());
                    if let Some(color) = &config.glasses.color {
                        identity = identity.with_color(color.clone());
                    }
                    layers.push(Layer::plain(LayerName::Glasses, identity));
                }
            }
            LayerName::WingsForeground => {
                if config.wings.enabled() {
                    layers.push(wing_layer(LayerName::WingsForeground, config));
                }
            }
            LayerName::Accessory => {
                for key in &config.accessories {
                    let (style, color) = paths::split_style_color(key);
                    let mut identity = ResourceIdentity::new(Category::Accessory, style);
                    if let Some(color) = color {
                        identity = identity.with_color(color);
                    }
                    layers.push(Layer::plain(LayerName::Accessory, identity));
                }
            }
        }
    }

    layers
}

fn hair_identity(category: Category, config: &AvatarConfiguration) -> ResourceIdentity {
    let identity = ResourceIdentity::new(category, config.hair.style.clone());
    if paths::hair_is_adult_only(&config.hair.style) {
        identity
    } else {
        identity.with_body(config.body.body_type)
    }
}

fn wing_layer(name: LayerName, config: &AvatarConfiguration) -> Layer {
    let category = if name == LayerName::WingsBackground {
        Category::WingsBackground
    } else {
        Category::WingsForeground
    };
    let mut layer = Layer::plain(
        name,
        ResourceIdentity::new(category, config.wings.style.clone()),
    );
    if let Some(color) = &config.wings.color {
        layer.tint = tint_for(color);
    }
    layer
}
