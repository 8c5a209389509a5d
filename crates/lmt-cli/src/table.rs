//! Fixed-width report tables printed to stdout.

use lmt_analysis::{
    exclusion::ExclusionTally,
    occupancy::{Comparison, ZoneDistribution},
    orientation::ZoneOrientation,
    zone::ZoneId,
};
use lmt_stats::proportion::Proportion;

const LABEL_WIDTH: usize = 16;

pub fn print_title(title: &str) {
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
}

fn print_separator(width: usize) {
    println!("  {}", "-".repeat(width));
}

fn proportion_cell(proportion: &Proportion) -> String {
    if proportion.insufficient_data {
        "n/a".to_owned()
    } else {
        format!("{:.1}% ±{:.1}", proportion.percentage, proportion.standard_error)
    }
}

/// One row per stratum: sample count, percentage, standard error and 95% CI.
pub fn print_proportions<'a, I>(label_col: &str, rows: I)
where
    I: IntoIterator<Item = (&'a str, &'a Proportion)>,
{
    println!(
        "  {:<LABEL_WIDTH$} {:>8} {:>10} {:>8} {:>18}",
        label_col, "n", "Percent", "SE", "95% CI"
    );
    // label + n(8) + percent(10) + se(8) + ci(18) + spaces(4)
    print_separator(LABEL_WIDTH + 48);
    for (label, proportion) in rows {
        if proportion.insufficient_data {
            println!(
                "  {label:<LABEL_WIDTH$} {:>8} {:>10}",
                proportion.trials, "insufficient data"
            );
            continue;
        }
        let low = (proportion.percentage - proportion.ci95).max(0.0);
        let high = (proportion.percentage + proportion.ci95).min(100.0);
        println!(
            "  {label:<LABEL_WIDTH$} {:>8} {:>9.1}% {:>8.2} {:>18}",
            proportion.trials,
            proportion.percentage,
            proportion.standard_error,
            format!("[{low:.1}, {high:.1}]"),
        );
    }
}

/// One row per zone, one column per named distribution.
pub fn print_zone_distributions(zones: &[ZoneId], columns: &[(&str, &ZoneDistribution)]) {
    print!("  {:<LABEL_WIDTH$}", "Zone");
    for (name, distribution) in columns {
        print!(" {:>20}", format!("{name} (n={})", distribution.total()));
    }
    println!();
    print_separator(LABEL_WIDTH + 21 * columns.len());
    for (idx, zone) in zones.iter().enumerate() {
        print!("  {:<LABEL_WIDTH$}", zone.as_str());
        for (_, distribution) in columns {
            print!(" {:>20}", proportion_cell(&distribution.proportions[idx]));
        }
        println!();
    }
}

pub fn print_comparisons(comparisons: &[Comparison]) {
    println!(
        "  {:<LABEL_WIDTH$} {:>10} {:>4} {:>10} {:>10}  {}",
        "Comparison", "Chi2", "dof", "p", "Min exp", "Verdict"
    );
    print_separator(LABEL_WIDTH + 60);
    for comparison in comparisons {
        let test = &comparison.test;
        println!(
            "  {:<LABEL_WIDTH$} {:>10.3} {:>4} {:>10.4} {:>10.1}  {}",
            format!("{} vs {}", comparison.first, comparison.second),
            test.statistic,
            test.dof,
            test.p_value,
            test.min_expected,
            comparison.significance,
        );
    }
}

/// Angular histograms of one zone as fractions per bin, bins in degrees.
pub fn print_orientation(zone: &ZoneOrientation) {
    println!(
        "  Zone {} (post n={}, random n={})",
        zone.zone,
        zone.post.total(),
        zone.random.total()
    );
    println!("  {:>14} {:>10} {:>10}", "Bin (deg)", "Post", "Random");
    print_separator(36);
    let fraction = |fractions: &Option<Vec<f64>>, idx: usize| {
        fractions
            .as_ref()
            .map_or_else(|| "-".to_owned(), |f| format!("{:.3}", f[idx]))
    };
    for (idx, bin) in zone.post.bins.iter().enumerate() {
        let range = format!(
            "{:.0}-{:.0}",
            bin.range.start.to_degrees(),
            bin.range.end.to_degrees()
        );
        println!(
            "  {range:>14} {:>10} {:>10}",
            fraction(&zone.post_fractions, idx),
            fraction(&zone.random_fractions, idx),
        );
    }
}

pub fn print_exclusions(title: &str, exclusions: &ExclusionTally) {
    if exclusions.is_empty() {
        println!("  {title}: none");
        return;
    }
    println!("  {title} ({} total):", exclusions.total());
    for (reason, count) in exclusions.iter() {
        println!("    {:<LABEL_WIDTH$} {count:>8}", reason.to_string());
    }
}
