//! Writes `sample_data.csv` and `sample_data.parquet` for trying the
//! dashboard: ids, a category, a few correlated measurements, a boolean
//! flag and a score column with gaps.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const ROWS: usize = 250;
const CATEGORIES: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// splitmix64; plenty for sample data and stable across runs.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller.
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

struct Sample {
    id: Vec<i64>,
    category: Vec<&'static str>,
    height: Vec<f64>,
    weight: Vec<f64>,
    temperature: Vec<f64>,
    flag: Vec<bool>,
    score: Vec<Option<f64>>,
}

fn generate(rng: &mut SplitMix) -> Sample {
    let mut s = Sample {
        id: Vec::with_capacity(ROWS),
        category: Vec::with_capacity(ROWS),
        height: Vec::with_capacity(ROWS),
        weight: Vec::with_capacity(ROWS),
        temperature: Vec::with_capacity(ROWS),
        flag: Vec::with_capacity(ROWS),
        score: Vec::with_capacity(ROWS),
    };
    for i in 0..ROWS {
        let category = CATEGORIES[(rng.next_u64() % CATEGORIES.len() as u64) as usize];
        let height = rng.normal(170.0, 9.0);
        // weight follows height, so the heatmap has something to show
        let weight = 0.9 * (height - 100.0) + rng.normal(0.0, 6.0);
        // slow drift plus noise for the trend plot
        let temperature = 18.0 + 4.0 * (i as f64 / 20.0).sin() + rng.normal(0.0, 0.8);
        let score = (rng.uniform() >= 0.12).then(|| (rng.normal(65.0, 12.0) * 10.0).round() / 10.0);

        s.id.push(i as i64 + 1);
        s.category.push(category);
        s.height.push((height * 10.0).round() / 10.0);
        s.weight.push((weight * 10.0).round() / 10.0);
        s.temperature.push((temperature * 100.0).round() / 100.0);
        s.flag.push(rng.uniform() < 0.4);
        s.score.push(score);
    }
    s
}

fn write_csv(sample: &Sample, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["id", "category", "height", "weight", "temperature", "flag", "score"])?;
    for i in 0..sample.id.len() {
        writer.write_record([
            sample.id[i].to_string(),
            sample.category[i].to_string(),
            sample.height[i].to_string(),
            sample.weight[i].to_string(),
            sample.temperature[i].to_string(),
            sample.flag[i].to_string(),
            sample.score[i].map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(sample: &Sample, path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("height", DataType::Float64, false),
        Field::new("weight", DataType::Float64, false),
        Field::new("temperature", DataType::Float64, false),
        Field::new("flag", DataType::Boolean, false),
        Field::new("score", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(sample.id.clone())),
        Arc::new(StringArray::from(sample.category.clone())),
        Arc::new(Float64Array::from(sample.height.clone())),
        Arc::new(Float64Array::from(sample.weight.clone())),
        Arc::new(Float64Array::from(sample.temperature.clone())),
        Arc::new(BooleanArray::from(sample.flag.clone())),
        Arc::new(Float64Array::from(sample.score.clone())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let sample = generate(&mut SplitMix(42));

    write_csv(&sample, "sample_data.csv")?;
    write_parquet(&sample, "sample_data.parquet")?;

    println!(
        "Wrote {} rows to sample_data.csv and sample_data.parquet",
        sample.id.len()
    );
    Ok(())
}
