//! Builds a few expressions, simplifies them, and prints the results.
//!
//! Run with:
//! ```bash
//! cargo run --example simplify -- --list-len 5 --dot
//! ```
//! Pass `-v` to see every rewrite rule as it fires.

use clap::Parser;
use simplelog::LevelFilter;

use zen_rs::error::Result;
use zen_rs::eval::Assignment;
use zen_rs::reference::ExprRef;
use zen_rs::simplify::Simplifier;
use zen_rs::types::{IntType, ObjectType, Type};
use zen_rs::value::{IntValue, Value};
use zen_rs::zen::{Zen, ZenConfig};

#[derive(Debug, Parser)]
#[command(author, version, about = "Expression simplification demo")]
struct Cli {
    /// Length of the list summed by the list-match example
    #[arg(long, value_name = "INT", default_value = "4")]
    list_len: u32,

    /// Cache size in bits (size = 2^bits)
    #[arg(long, value_name = "INT", default_value = "12", value_parser = clap::value_parser!(u8).range(0..=31))]
    cache_bits: u8,

    /// Print the simplified field-access example as DOT
    #[arg(long)]
    dot: bool,

    /// Log every fired rule
    #[arg(short, long)]
    verbose: bool,
}

fn sum_list(zen: &Zen, list: ExprRef) -> Result<ExprRef> {
    zen.list_match(list, zen.int(0u32), |z, head, tail| z.sum(head, sum_list(z, tail)?))
}

fn show(zen: &Zen, simplifier: &mut Simplifier, title: &str, e: ExprRef) -> color_eyre::Result<ExprRef> {
    let r = simplifier.simplify(e)?;
    println!("{}:", title);
    println!("  before = {} (size {})", zen.to_bracket_string(e), zen.size(e));
    println!("  after  = {} (size {})", zen.to_bracket_string(r), zen.size(r));
    Ok(r)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    simplelog::TermLogger::init(
        if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let zen = Zen::with_config(ZenConfig::default().with_cache_bits(usize::from(cli.cache_bits)));
    let mut simplifier = Simplifier::new(&zen);

    // Boolean identities
    let x = zen.arbitrary("x", Type::Bool);
    let f = zen.not(zen.not(zen.and(x, zen.bool(true))?)?)?;
    show(&zen, &mut simplifier, "double negation", f)?;

    // Field access through updates and conditionals
    let packet = ObjectType::new(
        "Packet",
        [("Src", Type::Int(IntType::U32)), ("Dst", Type::Int(IntType::U32))],
    );
    let p = zen.arbitrary("p", Type::Object(packet.clone()));
    let g = zen.arbitrary("g", Type::Bool);
    let dst = zen.arbitrary("dst", Type::Int(IntType::U32));
    let updated = zen.with_field(p, "Dst", dst)?;
    let fresh = zen.create_object(&packet, [("Src", zen.int(1u32)), ("Dst", dst)])?;
    let choice = zen.ite(g, updated, fresh)?;
    let e = zen.get_field(choice, "Dst")?;
    let field = show(&zen, &mut simplifier, "field access", e)?;

    // List match unrolling
    let items: Vec<ExprRef> = (1..=cli.list_len).map(|i| zen.int(i)).collect();
    let list = zen.list(Type::Int(IntType::U32), &items)?;
    let total = sum_list(&zen, list)?;
    show(&zen, &mut simplifier, "list sum", total)?;

    // Simplification preserves the value
    let mut assignment = Assignment::new();
    assignment.set(x, true).set(g, false).set(dst, Value::Int(IntValue::U32(80)));
    assignment.set(
        p,
        Value::Object(packet, vec![Value::Int(IntValue::U32(7)), Value::Int(IntValue::U32(8))]),
    );
    println!("value of field access = {:?}", zen.evaluate(e, &assignment)?);

    let cache = simplifier.cache();
    println!(
        "cache: {} entries, {} hits, {} misses, {} rewrites; {} nodes total",
        cache.len(),
        cache.hits(),
        cache.misses(),
        simplifier.num_rewrites(),
        zen.num_nodes()
    );

    if cli.dot {
        println!("{}", zen.to_dot(&[field])?);
    }

    Ok(())
}
