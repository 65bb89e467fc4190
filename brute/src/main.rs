//! Brute arena command-line application.
//!
//! Fighters and fight logs live in a JSON store under `BRUTE_DATA_DIR`.
//!
//! ```bash
//! cargo run -p brute -- fighter 0xabc
//! cargo run -p brute -- challenge 0xabc --seed 7
//! ```

mod config;

use brute_core::arena::{Arena, FightReport};
use brute_core::battle_log::BattleLog;
use brute_core::equipment::EquipmentSlot;
use brute_core::equipment::Item;
use brute_core::fighter::{AllocatableStat, Fighter, FighterClass, FighterId};
use brute_core::items::{items_of_kind, weapons_for, ITEMS};
use brute_core::persist::{FightId, JsonStore};
use config::CliConfig;
use std::time::{SystemTime, UNIX_EPOCH};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = CliConfig::from_env();
    let store = JsonStore::open(&config.data_dir).await?;
    tracing::debug!(data_dir = %store.root().display(), "opened store");
    let arena = Arena::new(store, config.battle.clone());
    let json = args.iter().any(|a| a == "--json");
    let positional: Vec<&str> = positional_args(&args);

    match positional.as_slice() {
        ["fighter", owner] => {
            let fighter = arena.fighter_for_owner(owner).await?;
            print_fighter(&fighter, json)?;
        }
        ["fight", a, b] => {
            let a: FighterId = a.parse()?;
            let b: FighterId = b.parse()?;
            let report = arena.fight(a, b, seed_from_args(&args)?).await?;
            print_report(&report, json)?;
        }
        ["challenge", owner] => {
            let fighter = arena.fighter_for_owner(owner).await?;
            let report = arena
                .challenge(owner, fighter.id, seed_from_args(&args)?)
                .await?;
            print_report(&report, json)?;
        }
        ["allocate", owner, stat, points] => {
            let stat = AllocatableStat::from_name(stat)
                .ok_or_else(|| format!("Unknown stat '{stat}', expected str, agi or int"))?;
            let points: i32 = points.parse()?;
            let fighter = arena.fighter_for_owner(owner).await?;
            let fighter = arena.allocate(owner, fighter.id, stat, points).await?;
            print_fighter(&fighter, json)?;
        }
        ["equip", owner, slot, item] => {
            let slot = EquipmentSlot::from_name(slot)
                .ok_or_else(|| format!("Unknown equipment slot '{slot}'"))?;
            let fighter = arena.fighter_for_owner(owner).await?;
            let fighter = arena.equip(owner, fighter.id, slot, item).await?;
            print_fighter(&fighter, json)?;
        }
        ["replay", fight] => {
            let fight: FightId = fight.parse()?;
            let record = arena.replay(fight).await?;
            print_log(&record.log, json)?;
        }
        ["items"] => print_items(ITEMS.iter()),
        ["items", filter] => {
            let items = if let Some(class) = FighterClass::from_name(filter) {
                weapons_for(class)
            } else if let Some(slot) = EquipmentSlot::from_name(filter) {
                items_of_kind(slot.item_kind())
            } else {
                return Err(format!("Unknown class or slot '{filter}'").into());
            };
            print_items(items.iter());
        }
        _ => {
            eprintln!("Unrecognized command. Run with --help for usage.");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Arguments that are neither flags nor flag values.
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => i += 1,
            "--json" => {}
            other => positional.push(other),
        }
        i += 1;
    }
    positional
}

/// `--seed N`, or the current time when absent.
fn seed_from_args(args: &[String]) -> Result<u64, Box<dyn std::error::Error>> {
    if let Some(i) = args.iter().position(|a| a == "--seed") {
        let value = args.get(i + 1).ok_or("--seed requires a value")?;
        return Ok(value.parse()?);
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Ok(now.as_nanos() as u64)
}

fn print_items<'a>(items: impl Iterator<Item = &'a Item>) {
    for item in items {
        let damage = item
            .damage
            .map(|d| format!(" [{d}]"))
            .unwrap_or_default();
        println!("{:<20} {:<10}{}", item.id, format!("{:?}", item.kind), damage);
    }
}

fn print_fighter(fighter: &Fighter, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(fighter)?);
        return Ok(());
    }

    let stats = fighter.total_stats();
    println!("{} ({}) - level {} {}", fighter.name, fighter.id, fighter.level, fighter.class);
    println!("  Owner: {}", fighter.owner);
    println!(
        "  XP: {}/{}  Free points: {}",
        fighter.experience,
        fighter.experience_to_next_level(),
        fighter.free_points
    );
    println!("  HP: {}/{}", fighter.hp.current, fighter.hp.maximum);
    println!(
        "  STR {}  AGI {}  INT {}  DEF {}  CRIT {}% x{}%  BLOCK {}%",
        stats.strength,
        stats.agility,
        stats.intelligence,
        stats.defense,
        stats.crit_chance,
        stats.crit_damage,
        stats.block_rate
    );
    let unlocked: Vec<&str> = fighter
        .unlocked_abilities()
        .map(|a| a.name.as_str())
        .collect();
    println!("  Abilities: {}", unlocked.join(", "));
    for (slot, item) in fighter.equipment.items() {
        println!("  {:<8} {}", slot.name(), item.name);
    }
    println!("  Sprite: {}", fighter.sprite_url());
    Ok(())
}

fn print_report(report: &FightReport, json: bool) -> CliResult {
    print_log(report.log(), json)?;
    if !json {
        println!();
        println!("Fight {} recorded.", report.fight_id());
        for fighter in [&report.fighter_a, &report.fighter_b] {
            println!(
                "  {} is level {} ({}/{} XP)",
                fighter.name,
                fighter.level,
                fighter.experience,
                fighter.experience_to_next_level()
            );
        }
    }
    Ok(())
}

fn print_log(log: &BattleLog, json: bool) -> CliResult {
    if json {
        println!("{}", log.to_json()?);
        return Ok(());
    }

    let [a, b] = &log.participants;
    println!(
        "{} (lvl {}, {} HP) vs {} (lvl {}, {} HP)",
        a.name, a.level, a.starting_hp, b.name, b.level, b.starting_hp
    );
    for step in &log.steps {
        let hp = step
            .hp
            .map(|hp| format!("  [{} / {}]", hp.fighter_a, hp.fighter_b))
            .unwrap_or_default();
        match &step.special_effect {
            Some(effect) => println!("[{}] {} ({effect}){hp}", step.step_type, step.description),
            None => println!("[{}] {}{hp}", step.step_type, step.description),
        }
    }
    if let Some(winner) = log.participant(log.outcome.winner) {
        println!(
            "Winner: {} after {} turns ({:?})",
            winner.name, log.outcome.turns, log.outcome.reason
        );
    }
    Ok(())
}

fn print_help() {
    println!("Brute - auto-battler arena");
    println!();
    println!("USAGE:");
    println!("  brute <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  fighter <OWNER>                    Show (or create) the owner's fighter");
    println!("  fight <FIGHTER_ID> <FIGHTER_ID>    Fight two stored fighters");
    println!("  challenge <OWNER>                  Fight a random opponent");
    println!("  allocate <OWNER> <STAT> <POINTS>   Spend free points (str, agi, int)");
    println!("  equip <OWNER> <SLOT> <ITEM>        Equip an item from the item list");
    println!("  replay <FIGHT_ID>                  Print a recorded fight");
    println!("  items [CLASS|SLOT]                 List items, or a class's weapons or a slot's items");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Show this help message");
    println!("  --seed <N>       Seed for the fight (default: current time)");
    println!("  --json           Print JSON instead of text");
    println!();
    println!("ENVIRONMENT:");
    println!("  BRUTE_DATA_DIR       Store directory (default: brute-data)");
    println!("  BRUTE_TURN_CAP       Maximum actions per fight (default: 100)");
    println!("  BRUTE_SKILL_CHANCE   Percent chance to try a skill (default: 30)");
    println!("  RUST_LOG             Log filter, e.g. brute_core=debug");
}
