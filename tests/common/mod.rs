#![allow(dead_code)]

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// `rows` people: 9-character names, ages cycling 20..=59, long city names.
pub fn people(rows: usize) -> DataFrame {
    df!(
        "Name" => (0..rows).map(|i| format!("person{:03}", i)).collect::<Vec<String>>(),
        "Age" => (0..rows).map(|i| 20 + (i as i64 % 40)).collect::<Vec<i64>>(),
        "City" => (0..rows)
            .map(|i| format!("Some Long City Name Number {}", i))
            .collect::<Vec<String>>()
    )
    .unwrap()
}

/// Write `people(rows)` as CSV into `dir`.
pub fn people_csv(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("people.csv");
    let mut df = people(rows);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}
