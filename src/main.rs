use schema_synth::cli::CommandLineInterface;
use schema_synth::compare::alloc::CountingAlloc;

// feeds the allocation column of `compare`
#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn main() -> anyhow::Result<()> {
    let command_line_interface = CommandLineInterface::load();
    command_line_interface.init_tracing();
    command_line_interface.run()
}
