//! Path resolution exercised through the public identity API.
//!
//! The alias tables are what make the asset tree navigable, so the full
//! body-type grid is pinned here for the categories whose folder varies
//! by body.

use paperdoll::assets::{Category, ResourceIdentity};
use paperdoll::avatar::split_style_color;
use paperdoll::BodyType;

const ALL_BODIES: [BodyType; 6] = [
    BodyType::Male,
    BodyType::Female,
    BodyType::Muscular,
    BodyType::Pregnant,
    BodyType::Teen,
    BodyType::Child,
];

#[test]
fn test_clothing_alias_grid() {
    let expected: [(BodyType, &str, &str, &str); 6] = [
        (BodyType::Male, "male", "male", "male"),
        (BodyType::Female, "female", "female", "female"),
        (BodyType::Muscular, "muscular", "male", "male"),
        (BodyType::Pregnant, "pregnant", "pregnant", "female"),
        (BodyType::Teen, "thin", "thin", "female"),
        (BodyType::Child, "child", "child", "child"),
    ];

    for (body, top_fit, bottom_fit, shoe_fit) in expected {
        let top = ResourceIdentity::new(Category::Top, "jacket").with_body(body);
        assert_eq!(
            top.resolve_path(),
            format!("torso/jacket/{top_fit}/base.png"),
            "top fit for {body:?}"
        );

        let bottom = ResourceIdentity::new(Category::Bottom, "jeans").with_body(body);
        assert_eq!(
            bottom.resolve_path(),
            format!("legs/jeans/{bottom_fit}/base.png"),
            "bottom fit for {body:?}"
        );

        let shoes = ResourceIdentity::new(Category::Shoes, "boots").with_body(body);
        assert_eq!(
            shoes.resolve_path(),
            format!("feet/boots/{shoe_fit}/base.png"),
            "shoe fit for {body:?}"
        );
    }
}

#[test]
fn test_head_hair_and_eyes_alias_grids() {
    for body in ALL_BODIES {
        let head_fit = match body {
            BodyType::Male | BodyType::Muscular => "male",
            BodyType::Female | BodyType::Pregnant | BodyType::Teen => "female",
            BodyType::Child => "child",
        };

        // Wolf heads are per-body-type; hair shares the same three-way split.
        let head = ResourceIdentity::new(Category::Head, "wolf")
            .with_color("tan")
            .with_body(body);
        assert_eq!(head.resolve_path(), format!("heads/wolf/{head_fit}/tan.png"));

        let hair = ResourceIdentity::new(Category::Hair, "braid").with_body(body);
        assert_eq!(hair.resolve_path(), format!("hair/braid/{head_fit}/base.png"));

        let eyes_fit = if body == BodyType::Child { "child" } else { "adult" };
        let eyes = ResourceIdentity::bare(Category::Eyes)
            .with_color("green")
            .with_body(body);
        assert_eq!(eyes.resolve_path(), format!("eyes/{eyes_fit}/green.png"));
    }
}

#[test]
fn test_resolution_is_total_for_every_category_and_body() {
    let categories = [
        Category::Body,
        Category::Head,
        Category::Eyes,
        Category::Hair,
        Category::HairBack,
        Category::Beard,
        Category::Top,
        Category::Bottom,
        Category::Shoes,
        Category::Hat,
        Category::Glasses,
        Category::WingsBackground,
        Category::WingsForeground,
        Category::Tail,
        Category::Horns,
        Category::Ears,
        Category::Accessory,
        Category::Custom("scarves".to_string()),
    ];

    for category in &categories {
        for body in ALL_BODIES {
            let path = ResourceIdentity::new(category.clone(), "anything")
                .with_color("teal")
                .with_body(body)
                .resolve_path();
            assert!(path.ends_with(".png"), "{category}: {path}");
            assert!(
                path.split('/').all(|segment| !segment.is_empty()),
                "{category}: empty segment in {path}"
            );
        }
    }
}

#[test]
fn test_aliased_bodies_share_paths_but_not_identities() {
    // Teen and pregnant boots collapse onto the female folder, yet the two
    // identities stay distinct cache keys.
    let teen = ResourceIdentity::new(Category::Shoes, "boots").with_body(BodyType::Teen);
    let pregnant = ResourceIdentity::new(Category::Shoes, "boots").with_body(BodyType::Pregnant);

    assert_eq!(teen.resolve_path(), pregnant.resolve_path());
    assert_ne!(teen, pregnant);
}

#[test]
fn test_composite_key_splitting() {
    assert_eq!(
        split_style_color("cape_royal_blue"),
        ("cape".to_string(), Some("royal_blue".to_string()))
    );
    assert_eq!(
        split_style_color("shoulder_bag_dark_brown"),
        ("shoulder_bag".to_string(), Some("dark_brown".to_string()))
    );
    assert_eq!(
        split_style_color("shoulder_bag_brown"),
        ("shoulder_bag".to_string(), Some("brown".to_string()))
    );
    assert_eq!(split_style_color("monocle"), ("monocle".to_string(), None));
}
