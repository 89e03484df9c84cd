//! Synthetic population file loading.
//!
//! A population file is a headered CSV with one row per person:
//!
//! ```text
//! age,sex,household_id,workplace_id,school_id
//! 34.0,F,12,400,
//! 8.5,M,12,,71
//! ```
//!
//! `workplace_id` and `school_id` may be empty.  Rows are admitted in
//! file order, so loading the same file always produces the same
//! slot and identifier assignment.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use epi_core::GroupId;
use serde::Deserialize;

use crate::person::Sex;
use crate::population::Population;
use crate::{SimError, SimResult};

#[derive(Debug, Deserialize)]
struct PersonRecord {
    age: f64,
    sex: char,
    household_id: u32,
    workplace_id: Option<u32>,
    school_id: Option<u32>,
}

/// Loads a population CSV from `path`.  Returns the number of people
/// admitted.
pub fn load_population_file(
    path: impl AsRef<Path>,
    population: &mut Population,
) -> SimResult<usize> {
    let file = File::open(path)?;
    load_population_reader(file, population)
}

/// Loads a population CSV from any reader.
pub fn load_population_reader<R: Read>(
    reader: R,
    population: &mut Population,
) -> SimResult<usize> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut admitted = 0usize;
    for (row, result) in csv_reader.deserialize::<PersonRecord>().enumerate() {
        let record = result?;
        let sex = Sex::from_code(record.sex).ok_or_else(|| SimError::PopulationField {
            record: row as u64 + 1,
            message: format!("unknown sex code {:?}", record.sex),
        })?;
        if record.age < 0.0 {
            return Err(SimError::PopulationField {
                record: row as u64 + 1,
                message: format!("negative age {}", record.age),
            });
        }
        population.add_person(
            record.age,
            sex,
            GroupId(record.household_id),
            record.workplace_id.map(GroupId),
            record.school_id.map(GroupId),
        )?;
        admitted += 1;
    }
    log::info!("loaded {admitted} people from population file");
    Ok(admitted)
}
