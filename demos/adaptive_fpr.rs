use adaptive_qf::{
    AdaptiveFilter, FilterConfigBuilder, FilterStats, OpFlags, common::rate2hr,
};
use comfy_table::{
    Cell, CellAlignment, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::HashSet;

const FILL_RATIO: f64 = 0.75;
const PROBES: usize = 50_000;
const PASSES: usize = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("╔═══════════════════════════════════════════════════════╗");
    println!("║  Adaptive Quotient Filter - Repeated Query FPR Tester  ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!("Configuration:");
    println!("  • Fill Ratio: {}%", FILL_RATIO * 100.0);
    println!("  • Probes per pass: {PROBES}");
    println!("  • Passes over the same probes: {PASSES}\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("qbits/rbits").set_alignment(CellAlignment::Center),
            Cell::new("Elements").set_alignment(CellAlignment::Center),
            Cell::new("Expected FPR").set_alignment(CellAlignment::Center),
            Cell::new("Pass 1").set_alignment(CellAlignment::Center),
            Cell::new("Pass 2").set_alignment(CellAlignment::Center),
            Cell::new("Pass 3").set_alignment(CellAlignment::Center),
            Cell::new("Fresh probes").set_alignment(CellAlignment::Center),
            Cell::new("Slots used").set_alignment(CellAlignment::Center),
        ]);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    for (qbits, rbits) in [(12u8, 5u8), (12, 7), (14, 7), (16, 9)] {
        print!("Testing qbits={qbits}, rbits={rbits}: ");
        let config = FilterConfigBuilder::default()
            .qbits(qbits)
            .rbits(rbits)
            .build()?;
        let mut filter = AdaptiveFilter::create(config)?;
        let flags = OpFlags::default();

        let count = ((1usize << qbits) as f64 * FILL_RATIO) as usize;
        let mut members = HashSet::with_capacity(count);
        while members.len() < count {
            members.insert(rng.random::<u64>());
        }
        print!("Inserting... ");
        for &key in &members {
            filter.insert(key, flags)?;
        }
        let expected = filter.filter().false_positive_rate();

        let probes = non_members(&mut rng, &members, PROBES);
        print!("Probing... ");
        let mut rates = Vec::with_capacity(PASSES);
        for _ in 0..PASSES {
            let mut false_positives = 0;
            for &key in &probes {
                if filter.filter().contains(key, flags) {
                    false_positives += 1;
                }
                // Answers false for every probe and adapts on a hit.
                filter.contains(key, flags)?;
            }
            rates.push(false_positives as f64 / probes.len() as f64);
        }

        let fresh = non_members(&mut rng, &members, PROBES);
        let fresh_hits = fresh
            .iter()
            .filter(|&&key| filter.filter().contains(key, flags))
            .count();
        println!("Done!");

        let stats = filter.filter().stats();
        table.add_row(vec![
            Cell::new(format!("{qbits}/{rbits}")),
            Cell::new(count.to_string()),
            Cell::new(rate2hr(expected)),
            Cell::new(rate2hr(rates[0])),
            Cell::new(rate2hr(rates[1])),
            Cell::new(rate2hr(rates[2])),
            Cell::new(rate2hr(fresh_hits as f64 / fresh.len() as f64)),
            Cell::new(format!("{} / {}", stats.used_slots, stats.total_slots)),
        ]);
    }

    println!("\n{table}");
    println!("\nPass 1 matches the static filter; later passes over the same");
    println!("probes only hit entries that could not be lengthened further.");
    Ok(())
}

fn non_members(rng: &mut StdRng, members: &HashSet<u64>, count: usize) -> Vec<u64> {
    let mut probes = Vec::with_capacity(count);
    while probes.len() < count {
        let key = rng.random::<u64>();
        if !members.contains(&key) {
            probes.push(key);
        }
    }
    probes
}
