pub mod errors;

pub use errors::{PointFailure, ScanError, ScanResult};

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The three neutral states of the CP-conserving 2HDM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HiggsBoson {
    Light,
    Heavy,
    Pseudoscalar,
}

impl HiggsBoson {
    pub const ALL: [Self; 3] = [Self::Light, Self::Heavy, Self::Pseudoscalar];

    /// Short label used in observable names and output files.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "h",
            Self::Heavy => "H",
            Self::Pseudoscalar => "A",
        }
    }

    /// Higgs selector understood by SusHi (block `SUSHI`, entry 2).
    pub const fn sushi_code(self) -> u32 {
        match self {
            Self::Light => 11,
            Self::Heavy => 12,
            Self::Pseudoscalar => 21,
        }
    }

    /// PDG particle number under which 2HDMC reports mass and decays.
    pub const fn pdg_id(self) -> i32 {
        match self {
            Self::Light => 25,
            Self::Heavy => 35,
            Self::Pseudoscalar => 36,
        }
    }
}

impl Display for HiggsBoson {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Yukawa sector of the model. Only the two canonical types are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YukawaType {
    TypeOne,
    TypeTwo,
}

impl YukawaType {
    /// Numeric code used by both 2HDMC and SusHi.
    pub const fn code(self) -> u8 {
        match self {
            Self::TypeOne => 1,
            Self::TypeTwo => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::TypeOne),
            2 => Some(Self::TypeTwo),
            _ => None,
        }
    }
}

/// One fully specified model point in the hybrid basis.
///
/// The hybrid basis fixes the scalar potential through the two CP-even
/// masses, cos(beta-alpha), the quartics Z4, Z5, Z7 and tan(beta).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    /// Light CP-even mass m_h in GeV.
    pub m_light: f64,
    /// Heavy CP-even mass m_H in GeV.
    pub m_heavy: f64,
    pub cos_betal: f64,
    pub z4: f64,
    pub z5: f64,
    pub z7: f64,
    pub tanb: f64,
    pub yukawa_type: YukawaType,
}

/// Symmetric or asymmetric uncertainty attached to a cross section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UncertaintyBand {
    pub down: f64,
    pub up: f64,
}

/// Everything harvested for one neutral state at one grid point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HiggsProperties {
    /// Mass in GeV as reported by 2HDMC.
    pub mass: f64,
    /// Gluon-fusion cross section in pb.
    pub gg_xs: f64,
    /// Bottom-quark-annihilation cross section in pb.
    pub bb_xs: f64,
    /// Branching ratio into tau pairs.
    pub br_tautau: f64,
    /// Renormalization/factorization scale band around `gg_xs`.
    pub gg_xs_scale: UncertaintyBand,
    /// Combined PDF + alpha_s band, present only when member runs were made.
    pub gg_xs_pdfas: Option<UncertaintyBand>,
    pub bb_xs_pdfas: Option<UncertaintyBand>,
    /// Effective top Yukawa relative to the SM.
    pub yukawa_top: f64,
    /// Effective bottom Yukawa relative to the SM.
    pub yukawa_bottom: f64,
}

/// Result of one successful grid point: the three per-boson harvests plus
/// the theory-consistency verdict from 2HDMC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub valid_model: bool,
    pub light: HiggsProperties,
    pub heavy: HiggsProperties,
    pub pseudoscalar: HiggsProperties,
}

impl PointRecord {
    pub fn new(valid_model: bool) -> Self {
        Self {
            valid_model,
            light: HiggsProperties::default(),
            heavy: HiggsProperties::default(),
            pseudoscalar: HiggsProperties::default(),
        }
    }

    pub const fn boson(&self, boson: HiggsBoson) -> &HiggsProperties {
        match boson {
            HiggsBoson::Light => &self.light,
            HiggsBoson::Heavy => &self.heavy,
            HiggsBoson::Pseudoscalar => &self.pseudoscalar,
        }
    }

    pub const fn boson_mut(&mut self, boson: HiggsBoson) -> &mut HiggsProperties {
        match boson {
            HiggsBoson::Light => &mut self.light,
            HiggsBoson::Heavy => &mut self.heavy,
            HiggsBoson::Pseudoscalar => &mut self.pseudoscalar,
        }
    }

    /// Flattens the record into named histogram layers.
    ///
    /// Model validity travels as an ordinary 0/1 layer so that downstream
    /// plotting can mask invalid regions without a side channel.
    pub fn observables(&self) -> Vec<(String, f64)> {
        let mut layers = Vec::with_capacity(25);
        for boson in HiggsBoson::ALL {
            let label = boson.label();
            let props = self.boson(boson);
            layers.push((format!("m_{label}"), props.mass));
            layers.push((format!("xs_gg{label}"), props.gg_xs));
            layers.push((format!("xs_bb{label}"), props.bb_xs));
            layers.push((format!("br_{label}tautau"), props.br_tautau));
            layers.push((format!("xs_gg{label}_scale_down"), props.gg_xs_scale.down));
            layers.push((format!("xs_gg{label}_scale_up"), props.gg_xs_scale.up));
            layers.push((format!("gt_{label}"), props.yukawa_top));
            layers.push((format!("gb_{label}"), props.yukawa_bottom));
            if let Some(band) = props.gg_xs_pdfas {
                layers.push((format!("xs_gg{label}_pdfas_down"), band.down));
                layers.push((format!("xs_gg{label}_pdfas_up"), band.up));
            }
            if let Some(band) = props.bb_xs_pdfas {
                layers.push((format!("xs_bb{label}_pdfas_down"), band.down));
                layers.push((format!("xs_bb{label}_pdfas_up"), band.up));
            }
        }
        layers.push((
            "model_validity".to_string(),
            if self.valid_model { 1.0 } else { 0.0 },
        ));
        layers
    }
}

#[cfg(test)]
mod tests {
    use super::{HiggsBoson, PointRecord, UncertaintyBand, YukawaType};

    #[test]
    fn boson_codes_follow_the_tool_conventions() {
        assert_eq!(HiggsBoson::Light.sushi_code(), 11);
        assert_eq!(HiggsBoson::Heavy.sushi_code(), 12);
        assert_eq!(HiggsBoson::Pseudoscalar.sushi_code(), 21);
        assert_eq!(HiggsBoson::Light.pdg_id(), 25);
        assert_eq!(HiggsBoson::Heavy.pdg_id(), 35);
        assert_eq!(HiggsBoson::Pseudoscalar.pdg_id(), 36);
        assert_eq!(HiggsBoson::Pseudoscalar.to_string(), "A");
    }

    #[test]
    fn yukawa_type_round_trips_through_codes() {
        assert_eq!(YukawaType::from_code(1), Some(YukawaType::TypeOne));
        assert_eq!(YukawaType::from_code(2), Some(YukawaType::TypeTwo));
        assert_eq!(YukawaType::from_code(3), None);
        assert_eq!(YukawaType::TypeTwo.code(), 2);
    }

    #[test]
    fn observables_cover_every_boson_and_validity() {
        let mut record = PointRecord::new(true);
        record.light.mass = 125.0;
        record.heavy.gg_xs = 2.5;
        let layers = record.observables();
        // 8 base layers per boson plus the validity layer.
        assert_eq!(layers.len(), 3 * 8 + 1);
        let names: Vec<&str> = layers.iter().map(|(name, _)| name.as_str()).collect();
        assert!(names.contains(&"m_h"));
        assert!(names.contains(&"xs_ggH"));
        assert!(names.contains(&"br_Atautau"));
        assert!(names.contains(&"gt_A"));
        assert!(names.contains(&"model_validity"));
        assert_eq!(layers.last().map(|(_, v)| *v), Some(1.0));
    }

    #[test]
    fn pdf_layers_appear_only_when_bands_are_present() {
        let mut record = PointRecord::new(false);
        record.boson_mut(HiggsBoson::Light).gg_xs_pdfas =
            Some(UncertaintyBand { down: -0.1, up: 0.1 });
        record.boson_mut(HiggsBoson::Light).bb_xs_pdfas =
            Some(UncertaintyBand { down: -0.2, up: 0.2 });
        let layers = record.observables();
        assert_eq!(layers.len(), 3 * 8 + 4 + 1);
        let names: Vec<&str> = layers.iter().map(|(name, _)| name.as_str()).collect();
        assert!(names.contains(&"xs_ggh_pdfas_down"));
        assert!(names.contains(&"xs_bbh_pdfas_up"));
        assert!(!names.contains(&"xs_ggH_pdfas_down"));
        assert_eq!(layers.last().map(|(_, v)| *v), Some(0.0));
    }
}
