use wiredef::codec::DataType as _;

use crate::cmd::{load_registry, TypesArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_types, OutputFormat, TypeRow};

pub fn run(args: TypesArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.protocol.protocol.as_deref())?;

    let rows: Vec<TypeRow> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let kind = registry.kind_of(name)?;
            let fixed_size = registry.get(name).and_then(|entry| entry.fixed_size());
            Some(TypeRow {
                name: name.to_string(),
                kind: kind.to_string(),
                fixed_size,
            })
        })
        .collect();

    print_types(&rows, format);
    Ok(SUCCESS)
}
