//! SusHi input decks.
//!
//! One deck per neutral state per grid point (plus one per PDF member when
//! uncertainty runs are on). Everything except the model point, the Higgs
//! selector and the PDF member is frozen, so the decks for two runs differ
//! exactly where the physics differs.

use crate::domain::{HiggsBoson, ModelInput};
use crate::lha::numbers::{format_decimal, format_real};
use crate::lha::{LhaBlock, LhaFile, entry};

/// Center-of-mass energy of the pp collider in GeV.
const CENTER_OF_MASS_ENERGY: &str = "13000.d0";

/// sin(beta-alpha) from the scanned cos(beta-alpha); the hybrid basis keeps
/// the angle in the first quadrant, so the positive root is the right one.
fn sin_betal(cos_betal: f64) -> f64 {
    (1.0 - cos_betal * cos_betal).max(0.0).sqrt()
}

/// Builds the complete deck for one run.
pub fn input_deck(input: &ModelInput, boson: HiggsBoson, pdf_member: Option<u32>) -> LhaFile {
    let sin_betal = format_real(sin_betal(input.cos_betal));
    let m_light = format_real(input.m_light);
    let m_heavy = format_real(input.m_heavy);
    let pdf_set = pdf_member.unwrap_or(0).to_string();

    let mut deck = LhaFile::new();
    deck.header.push("# SusHi input".to_string());
    deck.push_block(LhaBlock::with_entries(
        "SUSHI",
        "",
        vec![
            entry("1", "2", "model: 0 = SM, 1 = MSSM, 2 = 2HDM, 3 = NMSSM"),
            entry(
                "2",
                boson.sushi_code().to_string(),
                "11 = h, 12 = H, 21 = A",
            ),
            entry("3", "0", "collider: 0 = p-p, 1 = p-pbar"),
            entry(
                "4",
                CENTER_OF_MASS_ENERGY,
                "center-of-mass energy in GeV",
            ),
            entry("5", "2", "order ggh: -1 = off, 0 = LO, 1 = NLO, 2 = NNLO"),
            entry("6", "2", "order bbh: -1 = off, 0 = LO, 1 = NLO, 2 = NNLO"),
            entry("7", "1", "electroweak cont. for ggh"),
            entry("19", "0", "0 = silent mode of SusHi, 1 = normal output"),
            entry("20", "0", "ggh@nnlo subprocesses: 0=all, 10=ind. contributions"),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "2HDMC",
        "2HDMC arXiv:0902.0851",
        vec![
            entry(
                "-1",
                "0",
                "CMD line mode: 0 direct link to library, 1 command line mode",
            ),
            entry(
                "1",
                "3",
                "2HDMC key, 1=lambda basis, 2=physical basis, 3=H2 basis",
            ),
            entry(
                "2",
                input.yukawa_type.code().to_string(),
                "2HDM version type: (1=Type I,2=Type II,3=Flipped,4=Lepton Specific)",
            ),
            entry("3", format_decimal(input.tanb), "tan(beta)"),
            entry("4", "100.", "m12"),
            entry("21", m_light.clone(), "mh"),
            entry("22", m_heavy.clone(), "mH"),
            entry("23", "400d0", "mA"),
            entry("24", "400d0", "mC"),
            entry("25", sin_betal.clone(), "sin(beta-alpha)"),
            entry("26", "0.0d0", "lambda_6"),
            entry("27", "0.0d0", "lambda_7"),
            entry("31", m_light, "mh"),
            entry("32", m_heavy, "mH"),
            entry("33", sin_betal, "sin(beta-alpha)"),
            entry("34", format_real(input.z4), "Z4"),
            entry("35", format_real(input.z5), "Z5"),
            entry("36", format_real(input.z7), "Z7"),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "SMINPUTS",
        "Standard Model inputs",
        vec![
            entry("1", "1.27934000e+02", "alpha_em^(-1)(MZ) SM MSbar"),
            entry("2", "1.16637000e-05", "G_Fermi"),
            entry("3", "1.18000000e-01", "alpha_s(MZ) SM MSbar"),
            entry("4", "9.11876000e+01", "m_Z(pole)"),
            entry("5", "4.18000000e+00", "m_b(m_b)"),
            entry("6", "1.72500000e+02", "m_t(pole)"),
            entry("8", "1.27900000e+00", "m_c(m_c)"),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "DISTRIB",
        "",
        vec![
            entry("1", "0", "distribution : 0 = sigma_total, 1 = dsigma/dpt,"),
            entry("2", "0", "pt-cut: 0 = no, 1 = pt > ptmin, 2 = pt < ptmax,"),
            entry("21", "30.d0", "minimal pt-value ptmin in GeV"),
            entry("22", "100.d0", "maximal pt-value ptmax in GeV"),
            entry("3", "0", "rapidity-cut: 0 = no, 1 = Abs[y] < ymax,"),
            entry("31", "0.5d0", "minimal rapidity ymin"),
            entry("32", "1.5d0", "maximal rapidity ymax"),
            entry("4", "0", "0 = rapidity, 1 = pseudorapidity"),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "SCALES",
        "",
        vec![
            entry("1", "0.5", "renormalization scale muR/mh"),
            entry("2", "0.5", "factorization scale muF/mh"),
            entry("11", "1.0", "renormalization scale muR/mh for bbh"),
            entry("12", "0.25", "factorization scale muF/mh for bbh"),
            entry(
                "3",
                "0",
                "1 = Use (muR,muF)/Sqrt(mh^2+pt^2) for dsigma/dpt and d^2sigma/dy/dpt",
            ),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "RENORMBOT",
        "Renormalization of the bottom sector",
        vec![
            entry(
                "1",
                "0",
                "m_b used for bottom Yukawa:  0 = OS, 1 = MSbar(m_b), 2 = MSbar(muR)",
            ),
            entry("4", "4.75d0", "Fixed value of m_b^OS"),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "PDFSPEC",
        "",
        vec![
            entry("1", "MMHT2014lo68cl.LHgrid", "name of pdf (lo)"),
            entry("2", "PDF4LHC15_nlo_mc_pdfas.LHgrid", "name of pdf (nlo)"),
            entry("3", "PDF4LHC15_nnlo_mc_pdfas.LHgrid", "name of pdf (nnlo)"),
            entry("4", "PDF4LHC15_nnlo_mc_pdfas.LHgrid", "name of pdf (n3lo)"),
            entry(
                "11",
                "0",
                "set number - if different for LO, NLO, NNLO, N3LO use entries 11, 12, 13",
            ),
            entry(
                "12",
                pdf_set.clone(),
                "set number - if different for LO, NLO, NNLO, N3LO use entries 11, 12, 13",
            ),
            entry(
                "13",
                pdf_set,
                "set number - if different for LO, NLO, NNLO, N3LO use entries 11, 12, 13",
            ),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "VEGAS",
        "",
        vec![
            entry("1", "10000", "Number of points"),
            entry("2", "5", "Number of iterations"),
            entry("3", "10", "Output format of VEGAS integration"),
            entry("4", "2000", "Number of points"),
            entry("5", "5", "Number of iterations"),
            entry("14", "5000", "Number of points in second run"),
            entry("15", "2", "Number of iterations in second run"),
            entry("6", "0", "Output format of VEGAS integration"),
            entry("7", "2000", "Number of points"),
            entry("8", "5", "Number of iterations"),
            entry("17", "5000", "Number of points in second run"),
            entry("18", "2", "Number of iterations in second run"),
            entry("9", "0", "Output format of VEGAS integration"),
        ],
    ));
    deck.push_block(LhaBlock::with_entries(
        "FACTORS",
        "",
        vec![
            entry("1", "0.d0", "factor for yukawa-couplings: c"),
            entry("2", "1.d0", "t"),
            entry("3", "1.d0", "b"),
        ],
    ));
    deck
}
