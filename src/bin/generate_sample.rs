use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Days, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// (state, city, zip)
const LOCATIONS: &[(&str, &str, &str)] = &[
    ("CA", "Los Angeles", "90012"),
    ("CA", "San Diego", "92101"),
    ("TX", "Austin", "73301"),
    ("TX", "Houston", "77002"),
    ("MA", "Boston", "02134"),
    ("NJ", "Newark", "07102"),
];

/// (category, brand, type)
const PRODUCTS: &[(&str, &str, &str)] = &[
    ("Juice", "HealthyJuice", "Cold Pressed"),
    ("Juice", "HealthyJuice", "Concentrate"),
    ("Juice", "SunSip", "Cold Pressed"),
    ("Smoothie", "HealthyJuice", "Protein"),
    ("Smoothie", "GreenGo", "Vegan"),
];

const STORES_PER_LOCATION: usize = 4;
const DAYS: u64 = 181;
const ROWS_PER_DAY: usize = 40;

/// One CSV line, using the dataset's native column names.
#[derive(Serialize)]
struct PosRow {
    #[serde(rename = "POS_DT")]
    date: NaiveDate,
    #[serde(rename = "STATE")]
    state: &'static str,
    #[serde(rename = "CITY")]
    city: &'static str,
    #[serde(rename = "ZIP")]
    zip: &'static str,
    #[serde(rename = "IRI_TSA_CATEGORY")]
    category: Option<&'static str>,
    #[serde(rename = "IRI_TSA_BRAND")]
    brand: &'static str,
    #[serde(rename = "IRI_TSA_TYPE")]
    product_type: &'static str,
    #[serde(rename = "STOR_ID")]
    store_id: String,
    #[serde(rename = "STORE_SALES_AMOUNT")]
    sales_amount: f64,
    #[serde(rename = "STORE_SALES_UNITS")]
    sales_units: i64,
    #[serde(rename = "STORE_ON_HAND_UNITS")]
    on_hand_units: Option<i64>,
    #[serde(rename = "STORE_RECEIPT_UNITS")]
    receipt_units: i64,
    #[serde(rename = "STORE_OOS_IND")]
    out_of_stock: i64,
}

fn generate(rng: &mut SimpleRng, first_day: NaiveDate) -> Vec<PosRow> {
    let mut rows = Vec::with_capacity(DAYS as usize * ROWS_PER_DAY);

    for offset in 0..DAYS {
        let date = first_day + Days::new(offset);
        // Weekend lift.
        let lift = if date.weekday().number_from_monday() >= 6 { 1.4 } else { 1.0 };

        for _ in 0..ROWS_PER_DAY {
            let loc_idx = rng.below(LOCATIONS.len());
            let (state, city, zip) = LOCATIONS[loc_idx];
            let store_no = loc_idx * STORES_PER_LOCATION + rng.below(STORES_PER_LOCATION);
            let &(category, brand, product_type) = rng.pick(PRODUCTS);

            let out_of_stock = rng.chance(0.03 + 0.01 * (store_no % 5) as f64);
            let sales_units = if out_of_stock {
                0
            } else {
                1 + (rng.next_f64() * 12.0 * lift) as i64
            };
            let price = 3.49 + rng.below(4) as f64;

            rows.push(PosRow {
                date,
                state,
                city,
                zip,
                // A few rows arrive without a category, as in the real feed.
                category: (!rng.chance(0.01)).then_some(category),
                brand,
                product_type,
                store_id: format!("{:04}", 1000 + store_no),
                sales_amount: (sales_units as f64 * price * 100.0).round() / 100.0,
                sales_units,
                on_hand_units: (!rng.chance(0.02)).then(|| rng.below(60) as i64),
                receipt_units: if rng.chance(0.2) { 24 } else { 0 },
                out_of_stock: i64::from(out_of_stock),
            });
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[PosRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[PosRow]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    let text = |f: fn(&PosRow) -> Option<&str>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<StringArray>())
    };
    let ints = |f: fn(&PosRow) -> Option<i64>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<Int64Array>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("POS_DT", DataType::Date32, false),
        Field::new("STATE", DataType::Utf8, true),
        Field::new("CITY", DataType::Utf8, true),
        Field::new("ZIP", DataType::Utf8, true),
        Field::new("IRI_TSA_CATEGORY", DataType::Utf8, true),
        Field::new("IRI_TSA_BRAND", DataType::Utf8, true),
        Field::new("IRI_TSA_TYPE", DataType::Utf8, true),
        Field::new("STOR_ID", DataType::Utf8, true),
        Field::new("STORE_SALES_AMOUNT", DataType::Float64, true),
        Field::new("STORE_SALES_UNITS", DataType::Int64, true),
        Field::new("STORE_ON_HAND_UNITS", DataType::Int64, true),
        Field::new("STORE_RECEIPT_UNITS", DataType::Int64, true),
        Field::new("STORE_OOS_IND", DataType::Int64, true),
    ]));

    let dates: Date32Array = rows
        .iter()
        .map(|r| Some((r.date - epoch).num_days() as i32))
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(dates),
            text(|r| Some(r.state)),
            text(|r| Some(r.city)),
            text(|r| Some(r.zip)),
            text(|r| r.category),
            text(|r| Some(r.brand)),
            text(|r| Some(r.product_type)),
            text(|r| Some(r.store_id.as_str())),
            Arc::new(rows.iter().map(|r| Some(r.sales_amount)).collect::<Float64Array>()),
            ints(|r| Some(r.sales_units)),
            ints(|r| r.on_hand_units),
            ints(|r| Some(r.receipt_units)),
            ints(|r| Some(r.out_of_stock)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_pos.csv".to_string());
    let output_path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1).context("start date")?;
    let rows = generate(&mut rng, first_day);

    let is_parquet = output_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet") || e.eq_ignore_ascii_case("pq"));
    if is_parquet {
        write_parquet(output_path, &rows)?;
    } else {
        write_csv(output_path, &rows)?;
    }

    log::info!("Wrote {} POS rows to {output}", rows.len());
    println!(
        "Wrote {} POS rows ({} stores, {} days) to {output}",
        rows.len(),
        LOCATIONS.len() * STORES_PER_LOCATION,
        DAYS
    );
    Ok(())
}
