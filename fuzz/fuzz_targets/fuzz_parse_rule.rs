#![no_main]

use std::collections::BTreeMap;
use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use mc_command::builtin_registry;
use mc_data::MasterTable;
use mc_dsl::{CommandRegistry, Context, RuleNode};

fn registry() -> &'static CommandRegistry {
    static REGISTRY: OnceLock<CommandRegistry> = OnceLock::new();
    REGISTRY.get_or_init(builtin_registry)
}

fn seed_table() -> MasterTable {
    let records = (1..=4)
        .map(|id: i64| {
            let mut record = BTreeMap::new();
            record.insert("id".to_owned(), id.to_string());
            record.insert("x".to_owned(), (id * 3).to_string());
            record.insert("start_data".to_owned(), "2024-04-01 10:00:00".to_owned());
            record
        })
        .collect::<Vec<_>>();
    MasterTable::from_records("fuzz", records).expect("seed table")
}

fuzz_target!(|line: &str| {
    // Arbitrary lines must either parse and execute or fail with a typed
    // error; no panics either way.
    let Ok(tokens) = mc_dsl::tokenize(line) else {
        return;
    };
    let mut context = Context::new(seed_table(), tokens, registry());
    if let Ok(rule) = RuleNode::parse(&mut context) {
        let _ = rule.execute(&mut context);
    }
});
