#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const PEOPLE: [&str; 2] = ["Ana", "Beto"];
const SPLIT_TYPES: [&str; 3] = ["default", "custom", "payer_only"];

/// Writes a complete random ledger directory with `expenses` expense rows.
///
/// Every third expense is an installment expense; each of its installments
/// is paid with probability one half. Dates fall within 2024.
pub fn generate_ledger(dir: &Path, expenses: usize, seed: u64) -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut settings = csv::Writer::from_writer(File::create(dir.join("settings.csv"))?);
    settings.write_record(["person1_name", "person2_name", "person1_percentage"])?;
    let percentage = rng.gen_range(0..=100).to_string();
    settings.write_record(["Ana", "Beto", percentage.as_str()])?;
    settings.flush()?;

    let mut expense_rows = csv::Writer::from_writer(File::create(dir.join("expenses.csv"))?);
    expense_rows.write_record([
        "id",
        "description",
        "amount",
        "paid_by",
        "split_type",
        "custom_percentage",
        "is_installment",
        "total_installments",
        "installment_payer",
        "created_at",
    ])?;
    let mut installment_rows =
        csv::Writer::from_writer(File::create(dir.join("installments.csv"))?);
    installment_rows.write_record(["id", "expense_id", "installment_number", "paid_at"])?;

    let mut payment_id = 1;
    for id in 1..=expenses {
        let payer = PEOPLE[rng.gen_range(0..2)];
        let split_type = SPLIT_TYPES[rng.gen_range(0..3)];
        let custom = if split_type == "custom" {
            rng.gen_range(0..=100).to_string()
        } else {
            String::new()
        };
        let installments = if id % 3 == 0 { rng.gen_range(1..=12) } else { 0 };

        expense_rows.write_record([
            id.to_string(),
            format!("expense {id}"),
            cents(&mut rng),
            payer.to_string(),
            split_type.to_string(),
            custom,
            (installments > 0).to_string(),
            if installments > 0 { installments.to_string() } else { String::new() },
            if installments > 0 { payer.to_string() } else { String::new() },
            timestamp(&mut rng),
        ])?;

        for number in 1..=installments {
            if rng.gen_bool(0.5) {
                installment_rows.write_record([
                    payment_id.to_string(),
                    id.to_string(),
                    number.to_string(),
                    timestamp(&mut rng),
                ])?;
                payment_id += 1;
            }
        }
    }
    expense_rows.flush()?;
    installment_rows.flush()?;

    let mut transfers = csv::Writer::from_writer(File::create(dir.join("transfers.csv"))?);
    transfers.write_record(["id", "from_person", "to_person", "amount", "created_at"])?;
    for id in 1..=expenses / 4 {
        let from = rng.gen_range(0..2);
        transfers.write_record([
            id.to_string(),
            PEOPLE[from].to_string(),
            PEOPLE[1 - from].to_string(),
            cents(&mut rng),
            timestamp(&mut rng),
        ])?;
    }
    transfers.flush()?;

    Ok(())
}

fn cents(rng: &mut StdRng) -> String {
    let cents: u32 = rng.gen_range(1..=500_000);
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn timestamp(rng: &mut StdRng) -> String {
    format!(
        "2024-{:02}-{:02}T{:02}:{:02}:{:02}",
        rng.gen_range(1..=12),
        rng.gen_range(1..=28),
        rng.gen_range(0..24),
        rng.gen_range(0..60),
        rng.gen_range(0..60)
    )
}
