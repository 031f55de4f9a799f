use clap::Parser as ClapParser;
use std::process;

use runt::{
    Cell, DictionaryMode, PrimitiveDesc, Stacklet, Value, ValueKind, Vm, VmCreateInfo, VmError,
    VmResult, VmSettings,
};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Words and numbers to compile into one word and run
    #[arg(required = false, help = "Words to compose, e.g. `2 3 + .`")]
    words: Vec<String>,

    /// Size of the byte arena
    #[arg(long, default_value_t = 64 * 1024)]
    bytes: usize,

    /// Number of cells in the cell arena
    #[arg(long, default_value_t = 1024)]
    cells: usize,

    /// Full-string hashing and latest-definition-wins lookups
    #[arg(long, help = "Use the strict dictionary")]
    strict_dictionary: bool,
}

fn plugin(_vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
    println!("this is a plugin!");
    Ok(())
}

fn add(vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
    let b = vm.pop_float()?;
    let a = vm.pop_float()?;
    vm.stack.push_float(a + b)
}

fn mul(vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
    let b = vm.pop_float()?;
    let a = vm.pop_float()?;
    vm.stack.push_float(a * b)
}

fn dup(vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
    let top = *vm.stack.peek().ok_or(VmError::StackUnderflow)?;
    *vm.stack.push()? = top;
    Ok(())
}

fn print(vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
    let top = *vm.stack.peek().ok_or(VmError::StackUnderflow)?;
    println!("{}", show(vm, top)?);
    vm.stack.pop()?;
    Ok(())
}

const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("test", plugin),
    PrimitiveDesc::new("+", add),
    PrimitiveDesc::new("*", mul),
    PrimitiveDesc::new("dup", dup),
    PrimitiveDesc::new(".", print),
];

fn show(vm: &Vm<'_>, top: Stacklet) -> VmResult<String> {
    Ok(match (top.kind, top.value) {
        (ValueKind::Float, Value::Float(_)) => vm.to_float(top.value)?.to_string(),
        (ValueKind::Float, _) => top.float.to_string(),
        (_, Value::String(_)) => vm.to_str(top.value)?.to_string(),
        (_, Value::Cell(id)) => id.to_string(),
        _ => "nil".to_string(),
    })
}

/// Compiles `words` into one compound word: numbers become literal cells,
/// everything else is resolved in the dictionary and copied in.
fn compile(vm: &mut Vm<'_>, words: &[String]) -> Result<runt::CellId, String> {
    let head = vm.new_cell().map_err(|err| err.to_string())?;
    vm.begin_word(head).map_err(|err| err.to_string())?;

    for word in words {
        if let Err(err) = compile_word(vm, word) {
            if let Err(rollback) = vm.end_word() {
                log::warn!("could not close word {head}: {rollback}");
            }
            return Err(format!("{word}: {err}"));
        }
    }

    vm.end_word().map_err(|err| err.to_string())
}

fn compile_word(vm: &mut Vm<'_>, word: &str) -> VmResult<()> {
    if let Ok(number) = word.parse::<f32>() {
        let value = vm.mk_float(number)?;
        let cell = vm.new_cell()?;
        return vm.bind_literal(cell, value);
    }

    let entry = vm.search(word)?;
    let cell = vm.new_cell()?;
    vm.entry_copy(entry, cell)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut bytes = vec![0u8; cli.bytes];
    let mut cells = vec![Cell::EMPTY; cli.cells];
    let mut vm = Vm::new(VmCreateInfo {
        bytes: bytes.as_mut_slice(),
        cells: cells.as_mut_slice(),
        settings: VmSettings {
            dictionary: if cli.strict_dictionary {
                DictionaryMode::Strict
            } else {
                DictionaryMode::Compatible
            },
            ..VmSettings::default()
        },
    });

    if let Err(err) = vm.register_primitives(PRIMITIVES) {
        eprintln!("Error registering primitives: {err}");
        process::exit(1);
    }

    let word = match compile(&mut vm, &cli.words) {
        Ok(word) => word,
        Err(err) => {
            eprintln!("Error compiling: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = vm.exec(word) {
        eprintln!("Error executing: {err}");
        process::exit(1);
    }

    for slot in vm.stack.slots().iter().rev() {
        match show(&vm, *slot) {
            Ok(shown) => println!("{shown}"),
            Err(err) => eprintln!("Error printing: {err}"),
        }
    }
    vm.stack.clear();

    log::debug!(
        "{}/{} bytes and {}/{} cells used",
        vm.bytes_used(),
        vm.bytes_capacity(),
        vm.cells_used(),
        vm.cells_capacity()
    );
}
