//! Per-point file names.
//!
//! Every file a grid point produces is derived from one tag, so the run and
//! collect paths can never disagree about where an output lives.

use crate::domain::HiggsBoson;
use crate::grid::GridPoint;
use crate::lha::numbers::format_decimal;

/// Name of the JSON scan report dropped next to the artifact.
pub const REPORT_FILE: &str = "scan-report.json";

/// Tag identifying one grid point, e.g. `mH.300.0.tanb.8.5`.
pub fn point_tag(x_parameter: &str, y_parameter: &str, point: GridPoint) -> String {
    format!(
        "{x_parameter}.{}.{y_parameter}.{}",
        format_decimal(point.x),
        format_decimal(point.y)
    )
}

pub fn thdmc_output_name(tag: &str) -> String {
    format!("2HDMC_output.{tag}.out")
}

pub fn sushi_input_name(tag: &str, boson: HiggsBoson, pdf_member: Option<u32>) -> String {
    format!("{}.in", sushi_stem(tag, "SusHi_input", boson, pdf_member))
}

pub fn sushi_output_name(tag: &str, boson: HiggsBoson, pdf_member: Option<u32>) -> String {
    format!("{}.out", sushi_stem(tag, "SusHi_output", boson, pdf_member))
}

/// Name of the aggregated grid artifact for a scenario.
pub fn artifact_name(scenario: &str) -> String {
    format!("{scenario}.json")
}

fn sushi_stem(tag: &str, prefix: &str, boson: HiggsBoson, pdf_member: Option<u32>) -> String {
    let stem = format!("{prefix}.{tag}.H{}", boson.sushi_code());
    match pdf_member {
        Some(member) => format!("{stem}.pdf{member}"),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::{point_tag, sushi_input_name, sushi_output_name, thdmc_output_name};
    use crate::domain::HiggsBoson;
    use crate::grid::GridPoint;

    #[test]
    fn tags_spell_whole_numbers_with_a_decimal() {
        let tag = point_tag("mH", "tanb", GridPoint { x: 300.0, y: 8.5 });
        assert_eq!(tag, "mH.300.0.tanb.8.5");
    }

    #[test]
    fn file_names_encode_tag_boson_and_member() {
        let tag = "mH.300.0.tanb.8.5";
        assert_eq!(thdmc_output_name(tag), "2HDMC_output.mH.300.0.tanb.8.5.out");
        assert_eq!(
            sushi_input_name(tag, HiggsBoson::Light, None),
            "SusHi_input.mH.300.0.tanb.8.5.H11.in"
        );
        assert_eq!(
            sushi_output_name(tag, HiggsBoson::Pseudoscalar, Some(42)),
            "SusHi_output.mH.300.0.tanb.8.5.H21.pdf42.out"
        );
    }
}
