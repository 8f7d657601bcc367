use crate::output::{print_json, print_table};
use trail_core::command::{registry, Select};

pub fn run(json: bool) -> anyhow::Result<()> {
    let commands = registry();
    if json {
        return print_json(&commands);
    }

    let rows: Vec<Vec<String>> = commands
        .iter()
        .map(|c| {
            let inputs: Vec<String> = c
                .inputs
                .iter()
                .map(|i| {
                    let name = match i.select {
                        Select::Kind(k) => k.to_string(),
                        Select::Latest(p) => format!("latest {p}"),
                    };
                    if i.required {
                        name
                    } else {
                        format!("{name}?")
                    }
                })
                .collect();
            let name = if c.produces == "review" {
                format!("{}:<subtype>", c.name)
            } else {
                c.name.to_string()
            };
            vec![
                name,
                c.produces.to_string(),
                if inputs.is_empty() {
                    "-".to_string()
                } else {
                    inputs.join(", ")
                },
                c.summary.to_string(),
            ]
        })
        .collect();
    print_table(&["COMMAND", "PRODUCES", "READS", "SUMMARY"], &rows);
    Ok(())
}
