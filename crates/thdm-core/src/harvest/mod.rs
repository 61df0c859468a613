//! Observable assembly.
//!
//! Takes the parsed tool outputs for one grid point and folds them into a
//! [`PointRecord`]: masses, branching ratios and validity from 2HDMC, cross
//! sections and their uncertainties from SusHi, Yukawa couplings computed
//! from the input parameters themselves.

use crate::domain::{
    HiggsBoson, ModelInput, PointFailure, PointRecord, UncertaintyBand, YukawaType,
};
use crate::tools::sushi::SusHiOutput;
use crate::tools::thdmc::ThdmcOutput;

/// Number of PDF4LHC members run for the PDF + alpha_s band: members 1..=100
/// vary the PDF, 101 and 102 vary alpha_s.
pub const PDF_MEMBER_COUNT: u32 = 102;

/// Relative tolerance for the 2HDMC/SusHi mass cross-check. The tools solve
/// the same spectrum, so anything beyond rounding noise means one of them
/// ran on the wrong point.
pub const MASS_AGREEMENT_TOLERANCE: f64 = 1.0e-6;

/// SusHi results for one neutral state: the nominal run plus the PDF member
/// runs (empty when uncertainties are off).
#[derive(Debug)]
pub struct SusHiHarvest {
    pub nominal: SusHiOutput,
    pub pdf_members: Vec<SusHiOutput>,
}

/// Effective (top, bottom) Yukawa couplings relative to the SM.
pub fn yukawa_couplings(input: &ModelInput, boson: HiggsBoson) -> (f64, f64) {
    // atan lands beta in (0, pi/2) for positive tan(beta), acos in [0, pi].
    let beta = input.tanb.atan();
    let alpha = beta - input.cos_betal.acos();
    match (boson, input.yukawa_type) {
        (HiggsBoson::Light, YukawaType::TypeOne) => {
            let g = alpha.cos() / beta.sin();
            (g, g)
        }
        (HiggsBoson::Light, YukawaType::TypeTwo) => {
            (alpha.cos() / beta.sin(), -alpha.sin() / beta.cos())
        }
        (HiggsBoson::Heavy, YukawaType::TypeOne) => {
            let g = alpha.sin() / beta.sin();
            (g, g)
        }
        (HiggsBoson::Heavy, YukawaType::TypeTwo) => {
            (alpha.sin() / beta.sin(), alpha.cos() / beta.cos())
        }
        (HiggsBoson::Pseudoscalar, YukawaType::TypeOne) => (-1.0 / beta.tan(), 1.0 / beta.tan()),
        (HiggsBoson::Pseudoscalar, YukawaType::TypeTwo) => (-1.0 / beta.tan(), -beta.tan()),
    }
}

/// Builds the full record for one grid point. `harvests` holds one entry per
/// state in [`HiggsBoson::ALL`] order.
pub fn assemble_point(
    input: &ModelInput,
    thdmc: &ThdmcOutput,
    harvests: &[SusHiHarvest],
) -> Result<PointRecord, PointFailure> {
    let mut record = PointRecord::new(thdmc.valid_model()?);
    for (boson, harvest) in HiggsBoson::ALL.into_iter().zip(harvests) {
        let mass = thdmc.mass(boson)?;
        check_mass_agreement(harvest.nominal.mass()?, mass, boson)?;
        let (yukawa_top, yukawa_bottom) = yukawa_couplings(input, boson);
        let props = record.boson_mut(boson);
        props.mass = mass;
        props.br_tautau = thdmc.br_tautau(boson)?;
        props.gg_xs = harvest.nominal.gg_xs()?;
        props.bb_xs = harvest.nominal.bb_xs()?;
        props.gg_xs_scale = UncertaintyBand {
            down: harvest.nominal.gg_xs_scale_down()?,
            up: harvest.nominal.gg_xs_scale_up()?,
        };
        props.yukawa_top = yukawa_top;
        props.yukawa_bottom = yukawa_bottom;
        if !harvest.pdf_members.is_empty() {
            let gg: Vec<f64> = harvest
                .pdf_members
                .iter()
                .map(SusHiOutput::gg_xs)
                .collect::<Result<_, _>>()?;
            let bb: Vec<f64> = harvest
                .pdf_members
                .iter()
                .map(SusHiOutput::bb_xs)
                .collect::<Result<_, _>>()?;
            props.gg_xs_pdfas = Some(pdfas_band(&gg)?);
            props.bb_xs_pdfas = Some(pdfas_band(&bb)?);
        }
    }
    Ok(record)
}

/// Combined PDF + alpha_s band from the 102 member cross sections: sample
/// standard deviation of the first 100, half the spread of the last two,
/// added in quadrature and reported symmetrically.
pub fn pdfas_band(xs: &[f64]) -> Result<UncertaintyBand, PointFailure> {
    if xs.len() != PDF_MEMBER_COUNT as usize {
        return Err(PointFailure::Parse(format!(
            "expected {PDF_MEMBER_COUNT} PDF member cross sections, found {}",
            xs.len()
        )));
    }
    let pdf = sample_std_dev(&xs[..xs.len() - 2]);
    let alpha_s = (xs[xs.len() - 1] - xs[xs.len() - 2]) / 2.0;
    let combined = (pdf * pdf + alpha_s * alpha_s).sqrt();
    Ok(UncertaintyBand {
        down: -combined,
        up: combined,
    })
}

fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let squared = values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>();
    (squared / (n - 1.0)).sqrt()
}

fn check_mass_agreement(
    sushi_mass: f64,
    thdmc_mass: f64,
    boson: HiggsBoson,
) -> Result<(), PointFailure> {
    let scale = thdmc_mass.abs().max(1.0);
    if (sushi_mass - thdmc_mass).abs() > MASS_AGREEMENT_TOLERANCE * scale {
        return Err(PointFailure::Parse(format!(
            "SusHi and 2HDMC disagree on m_{boson}: {sushi_mass} vs {thdmc_mass}"
        )));
    }
    Ok(())
}
