use chained_multimap::Bucket;
use chained_multimap::Config;
use chained_multimap::ConstantHash;
use chained_multimap::FoldHash;
use chained_multimap::HashPolicy;
use chained_multimap::InlineBucket;
use chained_multimap::LinkedBucket;
use chained_multimap::ModuloHash;
use chained_multimap::TableHandle;
use clap::Parser;
use clap::ValueEnum;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Modulo,
    Constant,
    Foldhash,
}

#[derive(Parser, Debug)]
struct Args {
    /// Expected number of entries.
    #[arg(short = 's', long = "size", default_value_t = 10)]
    size: usize,

    /// Buckets allocated per expected entry.
    #[arg(short = 'a', long = "amplification", default_value_t = 10)]
    amplification: usize,

    #[arg(short = 'p', long = "policy", value_enum, default_value_t = Policy::Modulo)]
    policy: Policy,

    /// Store the first entry of each bucket inline.
    #[arg(long = "inline")]
    inline: bool,

    /// Random entries to insert after the duplicate-key walkthrough.
    #[arg(short = 'n', long = "fill", default_value_t = 1000)]
    fill: usize,

    /// Largest random key; smaller values produce more duplicates.
    #[arg(
        short = 'k',
        long = "key_range",
        default_value_t = 10_000,
        value_parser = clap::value_parser!(i32).range(0..)
    )]
    key_range: i32,
}

fn run<P: HashPolicy, B: Bucket>(args: &Args, policy: P) {
    let mut handle: TableHandle<P, B> = TableHandle::new();
    handle
        .allocate_with(
            args.size,
            policy,
            Config::new().amplification(args.amplification),
        )
        .expect("failed to allocate table");

    let capacity = handle.table().map_or(0, |table| table.capacity());
    println!("Allocated table with {capacity} buckets");

    for (key, value) in [(0, -1), (0, 1), (0, 2)] {
        handle.put(key, value).expect("put failed");
    }

    let mut values = vec![0; 1];
    let mut matches = handle.get(0, &mut values).expect("get failed");
    if matches > values.len() {
        println!("{matches} matches for key 0, retrying with a larger buffer");
        values.resize(matches, 0);
        matches = handle.get(0, &mut values).expect("get failed");
    }
    for (i, value) in values.iter().take(matches).enumerate() {
        println!("value of {i} is {value}");
    }

    handle.erase(0).expect("erase failed");
    println!(
        "After erase, key 0 has {} matches",
        handle.get(0, &mut []).expect("get failed")
    );

    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for _ in 0..args.fill {
        let key = rng.random_range(0..=args.key_range);
        let value = rng.random::<i32>();
        handle.put(key, value).expect("put failed");
    }

    if let Some(table) = handle.table() {
        println!("Inserted {} random entries", table.len());
        table.chain_length_histogram().print();
        table.stats().print();
    }

    handle.deallocate().expect("deallocate failed");
    println!("Table deallocated");
}

fn dispatch<B: Bucket>(args: &Args) {
    match args.policy {
        Policy::Modulo => run::<_, B>(args, ModuloHash),
        Policy::Constant => run::<_, B>(args, ConstantHash),
        Policy::Foldhash => run::<_, B>(args, FoldHash::with_seed(0x5eed)),
    }
}

fn main() {
    let args = Args::parse();

    if args.inline {
        dispatch::<InlineBucket>(&args);
    } else {
        dispatch::<LinkedBucket>(&args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_range_rejects_negative_values() {
        assert!(Args::try_parse_from(["driver", "--key_range", "-1"]).is_err());

        let args = Args::try_parse_from(["driver", "--key_range", "0"]).unwrap();
        assert_eq!(args.key_range, 0);
        assert_eq!(Args::try_parse_from(["driver"]).unwrap().key_range, 10_000);
    }
}
