//! Material reference data.

use shared::{ColorVariant, Finish, MaterialProfile};

use crate::error::{GeometryError, GeometryResult};

/// Material selected before the user picks one.
pub const DEFAULT_MATERIAL: &str = "PLA";

/// Immutable, ordered set of material profiles.
///
/// Built once at startup and shared read-only (`Arc<MaterialCatalog>`).
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCatalog {
    materials: Vec<MaterialProfile>,
}

impl MaterialCatalog {
    pub fn new(materials: Vec<MaterialProfile>) -> Self {
        Self { materials }
    }

    /// Materials offered by the shop.
    pub fn builtin() -> Self {
        const PLA_PLUS: &str =
            "Improved PLA with higher strength and toughness, still not very heat-resistant.";

        let solid = |name: &str, hex: &str, finish: Finish, stock: bool, info: &str| {
            variant(name, [hex, hex, hex], 1.0, finish, stock, info)
        };

        Self::new(vec![
            profile(
                "PLA+ 2.0",
                1.24,
                vec![
                    solid("Black", "#2e2e2e", Finish::Glossy, false, PLA_PLUS),
                    solid("Off-White", "#e4e6ea", Finish::Glossy, true, PLA_PLUS),
                    solid("Oak", "#bea98b", Finish::Glossy, true, PLA_PLUS),
                    solid("Sunny Orange", "#ff8635", Finish::Glossy, true, PLA_PLUS),
                    solid("Cyan", "#2aa0dc", Finish::Glossy, true, PLA_PLUS),
                ],
            ),
            profile(
                "PLA+ Silk",
                1.24,
                vec![
                    solid(
                        "Bronze",
                        "#e37e63",
                        Finish::Glossy,
                        true,
                        "Silky smooth, slightly metallic finish. Good for decorative prints, not as strong as standard PLA+.",
                    ),
                    solid(
                        "Gold",
                        "#f8cc36",
                        Finish::Glossy,
                        true,
                        "Silky smooth, slightly metallic finish. Best for display pieces and artistic projects.",
                    ),
                    variant(
                        "Red-Yellow-Blue",
                        ["#2a1e5b", "#b6447f", "#616214"],
                        1.0,
                        Finish::Glossy,
                        true,
                        "Color-shifting silk filament. Metallic look, colors will vary when printed. More for visuals than strength.",
                    ),
                ],
            ),
            profile(
                "PLA Meta",
                1.24,
                vec![solid(
                    "Gray",
                    "#707070",
                    Finish::Satin,
                    true,
                    "Special PLA blend with matte finish. Hides layer lines well, but slightly weaker than PLA+.",
                )],
            ),
            profile(
                "PLA Firefly",
                1.24,
                vec![variant(
                    "Blue",
                    ["#00ccff", "#00ccff", "#00ccff"],
                    0.8,
                    Finish::Glossy,
                    true,
                    "PLA that glows under UV light. Similar strength to normal PLA, mainly for decorative prints.",
                )],
            ),
            profile(
                "PLA Glow in the dark",
                1.24,
                vec![
                    variant(
                        "Blue",
                        ["#39c5e6", "#eaebdc", "#eaebdc"],
                        1.0,
                        Finish::Glossy,
                        true,
                        "Glows in the dark after light exposure. Slightly more brittle than regular PLA.",
                    ),
                    variant(
                        "Green",
                        ["#37dc6e", "#eaebdc", "#eaebdc"],
                        1.0,
                        Finish::Glossy,
                        false,
                        "Glows in the dark. Fun for display prints, not ideal for functional parts.",
                    ),
                ],
            ),
            profile(
                "PLA",
                1.24,
                vec![solid(
                    "Green",
                    "#4fb84e",
                    Finish::Glossy,
                    false,
                    "Easy to print, good detail. Decently strong but brittle, weak to UV and heat.",
                )],
            ),
            profile(
                "TPU",
                1.3,
                vec![
                    solid(
                        "Black",
                        "#454545",
                        Finish::Satin,
                        true,
                        "Flexible and impact-resistant. Great for phone cases, seals, or parts needing bendability.",
                    ),
                    solid(
                        "Gray",
                        "#77767d",
                        Finish::Satin,
                        true,
                        "Flexible and durable. Useful for parts that need to bend without breaking.",
                    ),
                ],
            ),
            profile(
                "PETG",
                1.27,
                vec![solid(
                    "Off-White",
                    "#e5e7eb",
                    Finish::Glossy,
                    true,
                    "Strong and slightly flexible. Good chemical and weather resistance, harder to print than PLA.",
                )],
            ),
            profile(
                "ASA",
                1.07,
                vec![solid(
                    "Gray",
                    "#787576",
                    Finish::Glossy,
                    true,
                    "Similar to ABS but with strong UV resistance. Great for outdoor parts.",
                )],
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&MaterialProfile> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Look up a material or fail with `UnknownMaterial`.
    pub fn require(&self, name: &str) -> GeometryResult<&MaterialProfile> {
        self.get(name).ok_or_else(|| GeometryError::UnknownMaterial {
            name: name.to_string(),
        })
    }

    /// Material names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialProfile> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn profile(name: &str, density: f64, variants: Vec<ColorVariant>) -> MaterialProfile {
    MaterialProfile {
        name: name.to_string(),
        density,
        price_per_kg: None,
        variants,
    }
}

fn variant(
    name: &str,
    colors: [&str; 3],
    opacity: f32,
    finish: Finish,
    stock: bool,
    information: &str,
) -> ColorVariant {
    ColorVariant {
        name: name.to_string(),
        color: colors[0].to_string(),
        color2: colors[1].to_string(),
        color3: colors[2].to_string(),
        opacity,
        finish,
        stock,
        information: information.to_string(),
    }
}
