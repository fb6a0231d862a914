use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a synthetic used-vehicle listings file with realistic gaps.
#[derive(Parser)]
#[command(name = "generate_listings")]
struct Args {
    /// Number of listings
    #[arg(long, default_value = "2000")]
    rows: usize,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output directory
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

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

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn between(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_u64() % (hi - lo + 1) as u64) as i64
    }

    /// `Some(v)` except with probability `p_missing`.
    fn gap<T>(&mut self, p_missing: f64, v: T) -> Option<T> {
        if self.chance(p_missing) {
            None
        } else {
            Some(v)
        }
    }
}

/// (manufacturer, model, type, typical cylinders)
const MODELS: &[(&str, &str, &str, i64)] = &[
    ("ford", "f-150", "pickup", 8),
    ("ford", "focus", "sedan", 4),
    ("ford", "explorer", "SUV", 6),
    ("chevrolet", "silverado 1500", "truck", 8),
    ("chevrolet", "malibu", "sedan", 4),
    ("toyota", "camry", "sedan", 4),
    ("toyota", "tacoma", "pickup", 6),
    ("honda", "civic", "sedan", 4),
    ("honda", "cr-v", "SUV", 4),
    ("ram", "1500", "truck", 8),
    ("jeep", "wrangler", "SUV", 6),
    ("bmw", "x5", "SUV", 6),
    ("nissan", "altima", "sedan", 4),
    ("subaru", "outback", "wagon", 4),
];

const CONDITIONS: &[&str] = &["new", "like new", "excellent", "good", "fair", "salvage"];
const COLORS: &[&str] = &["white", "black", "silver", "grey", "blue", "red", "green", "brown"];
const FUELS: &[&str] = &["gas", "gas", "gas", "diesel", "hybrid"];
const TRANSMISSIONS: &[&str] = &["automatic", "automatic", "manual"];

struct Listing {
    price: i64,
    model_year: Option<i64>,
    manufacturer: Option<&'static str>,
    model: &'static str,
    condition: Option<&'static str>,
    cylinders: Option<i64>,
    fuel: &'static str,
    odometer: Option<i64>,
    transmission: &'static str,
    kind: &'static str,
    paint_color: Option<&'static str>,
    is_4wd: Option<i64>,
    days_listed: i64,
}

fn generate(rng: &mut SimpleRng) -> Listing {
    let (manufacturer, model, kind, cylinders) =
        MODELS[(rng.next_u64() % MODELS.len() as u64) as usize];
    let year = rng.between(1995, 2019);
    let condition = rng.pick(CONDITIONS);
    let age = (2019 - year) as f64;
    let odometer = (age * 12000.0 * (0.6 + rng.next_f64() * 0.8)) as i64;
    let base = match kind {
        "truck" | "pickup" => 30000.0,
        "SUV" => 26000.0,
        _ => 20000.0,
    };
    let price = (base * 0.88f64.powf(age) * (0.7 + rng.next_f64() * 0.6)).max(1.0) as i64;
    let four_wd = matches!(kind, "truck" | "pickup" | "SUV") && rng.chance(0.7);
    let color = rng.pick(COLORS);

    Listing {
        price,
        model_year: rng.gap(0.07, year),
        manufacturer: rng.gap(0.01, manufacturer),
        model,
        condition: rng.gap(0.02, condition),
        cylinders: rng.gap(0.10, cylinders),
        fuel: rng.pick(FUELS),
        odometer: rng.gap(0.15, odometer),
        transmission: rng.pick(TRANSMISSIONS),
        kind,
        paint_color: rng.gap(0.18, color),
        // The export only marks 4wd listings; everything else is blank.
        is_4wd: four_wd.then_some(1),
        days_listed: rng.between(0, 120),
    }
}

const HEADER: [&str; 13] = [
    "price",
    "model_year",
    "manufacturer",
    "model",
    "condition",
    "cylinders",
    "fuel",
    "odometer",
    "transmission",
    "type",
    "paint_color",
    "is_4wd",
    "days_listed",
];

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn write_csv(path: &PathBuf, listings: &[Listing]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(HEADER)?;
    for l in listings {
        writer.write_record([
            l.price.to_string(),
            opt(l.model_year),
            opt(l.manufacturer),
            l.model.to_string(),
            opt(l.condition),
            opt(l.cylinders),
            l.fuel.to_string(),
            opt(l.odometer),
            l.transmission.to_string(),
            l.kind.to_string(),
            opt(l.paint_color),
            opt(l.is_4wd),
            l.days_listed.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &PathBuf, listings: &[Listing]) -> Result<()> {
    let ints = |f: fn(&Listing) -> Option<i64>| -> ArrayRef {
        Arc::new(Int64Array::from(listings.iter().map(f).collect::<Vec<_>>()))
    };
    let strs = |f: fn(&Listing) -> Option<&'static str>| -> ArrayRef {
        Arc::new(StringArray::from(listings.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        ints(|l| Some(l.price)),
        ints(|l| l.model_year),
        strs(|l| l.manufacturer),
        strs(|l| Some(l.model)),
        strs(|l| l.condition),
        ints(|l| l.cylinders),
        strs(|l| Some(l.fuel)),
        ints(|l| l.odometer),
        strs(|l| Some(l.transmission)),
        strs(|l| Some(l.kind)),
        strs(|l| l.paint_color),
        Arc::new(Float64Array::from(
            listings
                .iter()
                .map(|l| l.is_4wd.map(|v| v as f64))
                .collect::<Vec<_>>(),
        )),
        ints(|l| Some(l.days_listed)),
    ];

    let fields: Vec<Field> = HEADER
        .iter()
        .zip(&columns)
        .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    debug_assert!(schema.fields().iter().all(|f| f.data_type() != &DataType::Null));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let listings: Vec<Listing> = (0..args.rows).map(|_| generate(&mut rng)).collect();

    let csv_path = args.out_dir.join("vehicles_us_cleaned.csv");
    write_csv(&csv_path, &listings)?;
    let parquet_path = args.out_dir.join("vehicles_us.parquet");
    write_parquet(&parquet_path, &listings)?;

    println!(
        "Wrote {} listings to {} and {}",
        listings.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
