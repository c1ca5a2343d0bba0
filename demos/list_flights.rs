use clap::Parser;
use std::path::PathBuf;

use jpiedm::{FileDecoder, MetricId};

#[derive(Debug, Parser)]
struct Options {
    /// Path to the downloaded EDM log file
    input: PathBuf,

    /// Decode this flight's records instead of just listing flights
    #[arg(long)]
    flight: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();

    let data = std::fs::read(&options.input)?;
    let decoder = FileDecoder::new(&data)?;

    let metadata = decoder.metadata();
    println!("Tail number: {}", metadata.tail_number);
    println!("Model: EDM-{}", metadata.config_info.model);
    println!("Protocol: {:?}", metadata.protocol_version());
    println!("Flights: {}", decoder.descriptors().len());

    match options.flight {
        None => {
            for descriptor in decoder.descriptors() {
                match decoder.flight(descriptor.flight_id) {
                    Ok(flight) => {
                        let header = flight.header();
                        println!(
                            "  flight {} on {}-{:02}-{:02} {:02}:{:02}:{:02}, every {} s, {} words",
                            header.flight_number,
                            header.start_date.year,
                            header.start_date.month,
                            header.start_date.day,
                            header.start_time.hour,
                            header.start_time.minute,
                            header.start_time.second,
                            header.interval_secs,
                            descriptor.word_count,
                        );
                    }
                    Err(e) => {
                        println!("  flight {} ERROR: {}", descriptor.flight_id, e);
                    }
                }
            }
        }
        Some(flight_id) => {
            let mut flight = decoder.flight(flight_id)?;

            println!();
            println!("First 5 records of flight {}:", flight_id);
            for result in flight.by_ref().take(5) {
                let record = result?;
                println!(
                    "  [{}] fast={} egt1={:?} cht1={:?} rpm={:?} ff={:?}",
                    record.sequence,
                    record.is_fast,
                    record.metrics.get(&MetricId::Egt11),
                    record.metrics.get(&MetricId::Cht11),
                    record.metrics.get(&MetricId::Rpm1),
                    record.metrics.get(&MetricId::Ff11),
                );
            }

            let remaining = flight.by_ref().collect::<Result<Vec<_>, _>>()?.len();
            println!(
                "  {} more records ({} standard, {} fast)",
                remaining,
                flight.standard_count(),
                flight.fast_count(),
            );
        }
    }

    Ok(())
}
