//! Classification of the free-text feature list shown on a listing page.
//!
//! Every entry is a label line followed by value lines, e.g.
//! `"Tipo de inmueble\nPiso"`. All site wording lives in [`FEATURE_RULES`].

use crate::models::Features;
use tracing::debug;

/// How the value is read out of a matched entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    /// The line right after the label
    SecondLine,
    /// The last line of the text preceding a unit marker
    BeforeUnit(&'static str),
    /// "Sí"/"Si" as `"true"`, anything else as `"false"`
    YesNo,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureRule {
    pub label: &'static str,
    pub key: &'static str,
    pub transform: ValueTransform,
}

const fn rule(label: &'static str, key: &'static str, transform: ValueTransform) -> FeatureRule {
    FeatureRule {
        label,
        key,
        transform,
    }
}

/// Checked in order, the first label contained in an entry wins
pub const FEATURE_RULES: &[FeatureRule] = &[
    rule("Tipo de inmueble", "type", ValueTransform::SecondLine),
    rule("Consumo energía", "energy", ValueTransform::BeforeUnit(" kW")),
    rule("Emisiones", "emissions", ValueTransform::BeforeUnit(" kg")),
    rule("Orientación", "orientation", ValueTransform::SecondLine),
    rule("Antigüedad", "age", ValueTransform::SecondLine),
    rule("Parking", "parking", ValueTransform::SecondLine),
    rule("Planta", "floor", ValueTransform::SecondLine),
    rule("Estado", "state", ValueTransform::SecondLine),
    rule("Calefacción", "heating", ValueTransform::SecondLine),
    rule("Agua caliente", "water_heating", ValueTransform::SecondLine),
    rule("Ascensor", "elevator", ValueTransform::YesNo),
    rule("Amueblado", "furniture", ValueTransform::YesNo),
    rule("Mascotas", "pets", ValueTransform::YesNo),
];

impl ValueTransform {
    fn apply(self, entry: &str) -> Option<String> {
        let value = match self {
            Self::SecondLine => entry.lines().nth(1)?.trim().to_string(),
            Self::BeforeUnit(unit) => {
                let head = entry.split(unit).next()?;
                head.lines().last()?.trim().to_string()
            }
            Self::YesNo => {
                let answer = entry.lines().nth(1)?.trim().to_lowercase();
                matches!(answer.as_str(), "sí" | "si").to_string()
            }
        };

        (!value.is_empty()).then_some(value)
    }
}

/// Match one entry against the rule table
pub fn classify(entry: &str) -> Option<(&'static str, String)> {
    let rule = FEATURE_RULES.iter().find(|r| entry.contains(r.label))?;
    let value = rule.transform.apply(entry)?;
    Some((rule.key, value))
}

/// Classify every entry into `features`, dropping the ones no rule matches
pub fn collect_features<'a>(entries: impl IntoIterator<Item = &'a str>, features: &mut Features) {
    for entry in entries {
        match classify(entry) {
            Some((key, value)) => {
                features.insert(key.to_string(), value);
            }
            None => debug!("Feature not recognized: {:?}", entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_line_features() {
        assert_eq!(
            classify("Tipo de inmueble\nPiso"),
            Some(("type", "Piso".to_string()))
        );
        assert_eq!(
            classify("Planta\n3ª planta"),
            Some(("floor", "3ª planta".to_string()))
        );
        assert_eq!(
            classify("Agua caliente\nGas natural"),
            Some(("water_heating", "Gas natural".to_string()))
        );
    }

    #[test]
    fn unit_features_take_the_number() {
        assert_eq!(
            classify("Consumo energía\nE\n150 kWh m2 / año"),
            Some(("energy", "150".to_string()))
        );
        assert_eq!(
            classify("Emisiones\nE\n32 kg CO2 m2 / año"),
            Some(("emissions", "32".to_string()))
        );
    }

    #[test]
    fn yes_no_features() {
        assert_eq!(classify("Ascensor\nSí"), Some(("elevator", "true".to_string())));
        assert_eq!(classify("Amueblado\nsi"), Some(("furniture", "true".to_string())));
        assert_eq!(classify("Mascotas\nNo"), Some(("pets", "false".to_string())));
    }

    #[test]
    fn unknown_and_valueless_entries_are_dropped() {
        assert_eq!(classify("Terraza\nSí"), None);
        assert_eq!(classify("Orientación"), None);

        let mut features = Features::new();
        collect_features(["Terraza\nSí", "Orientación\nSur", "Estado\nCasi nuevo"], &mut features);
        assert_eq!(features.len(), 2);
        assert_eq!(features["orientation"], "Sur");
        assert_eq!(features["state"], "Casi nuevo");
    }
}
