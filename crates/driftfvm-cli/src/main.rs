// crates/driftfvm-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftfvm_algebra::spec::{
    linear_solver_category, linear_solver_type, LINEAR_SOLVER_NAMES, PRECONDITIONER_NAMES,
};
use driftfvm_device::{descriptor, BcType, ExtCircuit, ModelLevel, SerialComm, System};
use driftfvm_material::by_name;
use driftfvm_math::units::UM;
use driftfvm_mesh::builders::{cube_mesh, line_mesh};
use driftfvm_solver::newton::{dc_sweep, solve_steady_state};
use driftfvm_solver::SolveParams;

#[derive(Parser, Debug)]
#[command(
    name = "driftfvm",
    about = "driftfvm device simulator CLI",
    long_about = "driftfvm device simulator CLI.\n\nBuild canonical device structures, run equilibrium and DC sweeps, and inspect boundary-condition decks.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Solve a 1D p-n diode: equilibrium point, then an optional anode sweep.
    Diode {
        /// Node count of the line mesh (>1)
        #[arg(long, default_value_t = 101, value_parser = clap::value_parser!(u32).range(2..))]
        nodes: u32,

        /// Device length [μm]
        #[arg(long, default_value_t = 1.0)]
        length: f64,

        /// Acceptor doping of the left half [cm^-3]
        #[arg(long, default_value_t = 1.0e18)]
        na: f64,

        /// Donor doping of the right half [cm^-3]
        #[arg(long, default_value_t = 1.0e18)]
        nd: f64,

        /// Sweep the anode from 0 to this bias [V] (0 = equilibrium only)
        #[arg(long, default_value_t = 0.0)]
        sweep_to: f64,

        /// Sweep step [V]
        #[arg(long, default_value_t = 0.05)]
        step: f64,

        /// Output path for the I-V data (JSON)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Solve a metal block with solder pads on opposite faces.
    PadBlock {
        /// Block edge length in x and y [μm]
        #[arg(long, default_value_t = 10.0)]
        width: f64,

        /// Block thickness in z [μm]
        #[arg(long, default_value_t = 1.0)]
        thickness: f64,

        /// Pad bias [V]
        #[arg(long, default_value_t = 1.0)]
        bias: f64,

        /// Metal material name
        #[arg(long, default_value = "al")]
        metal: String,
    },

    /// Print the boundary-condition deck of the canonical diode structure.
    Describe {
        /// Anode bias [V]
        #[arg(long, default_value_t = 0.0)]
        bias: f64,
    },

    /// List the recognised solver and preconditioner selection strings.
    SolveSpec,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Diode {
            nodes,
            length,
            na,
            nd,
            sweep_to,
            step,
            out,
        } => diode(nodes as usize, length, na, nd, sweep_to, step, out),
        Cmd::PadBlock {
            width,
            thickness,
            bias,
            metal,
        } => pad_block(width, thickness, bias, &metal),
        Cmd::Describe { bias } => describe(bias),
        Cmd::SolveSpec => solve_spec(),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

/// The canonical abrupt p-n diode on a line mesh.
fn diode_system(nodes: usize, length_um: f64, na: f64, nd: f64) -> Result<System> {
    let length = length_um * UM;
    let mesh = line_mesh(nodes, length, 1.0e-8, |_| 0).context("building diode mesh")?;
    let si = by_name("si")?;
    let mut sys = System::new(mesh, &[si], ModelLevel::Ddm1)?;
    let mid = length / 2.0;
    sys.set_doping(|p| if p.x < mid { (na, 0.0) } else { (0.0, nd) });
    sys.add_boundary("left", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))?;
    sys.add_boundary("right", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))?;
    sys.finalize();
    Ok(sys)
}

#[derive(Serialize)]
struct IvPoint {
    v: f64,
    i: f64,
}

#[allow(clippy::too_many_arguments)]
fn diode(
    nodes: usize,
    length: f64,
    na: f64,
    nd: f64,
    sweep_to: f64,
    step: f64,
    out: Option<PathBuf>,
) -> Result<()> {
    if step <= 0.0 {
        bail!("sweep step must be positive, got {step}");
    }
    info!(nodes, length, na, nd, "building diode");
    let mut sys = diode_system(nodes, length, na, nd)?;
    let comm = SerialComm;
    let params = SolveParams::default();

    let (x, report) = solve_steady_state(&mut sys, &comm, &params)?;
    let junction = x[sys.offset(0, sys.graphs[0].n_nodes() - 1)] - x[sys.offset(0, 0)];
    println!(
        "Equilibrium: {} iterations, residual {:.3e}, built-in potential {:.4} V",
        report.iterations, report.residual, junction
    );

    if sweep_to > 0.0 {
        let n_steps = (sweep_to / step).round() as usize;
        let voltages: Vec<f64> = (0..=n_steps).map(|k| k as f64 * step).collect();
        // Anode is the p-side (left) contact.
        let iv = dc_sweep(&mut sys, &comm, &params, 0, &voltages)?;
        for &(v, i) in &iv {
            println!("V = {v:.3} V    I = {i:+.6e} A");
        }
        if let Some(path) = out {
            ensure_parent_dir(&path)?;
            let f = File::create(&path).with_context(|| format!("create {}", path.display()))?;
            let mut w = BufWriter::new(f);
            let points: Vec<IvPoint> = iv.iter().map(|&(v, i)| IvPoint { v, i }).collect();
            serde_json::to_writer_pretty(&mut w, &points).context("serialize I-V data")?;
            w.flush()?;
            println!("Wrote {} sweep points", points.len());
        }
    }
    Ok(())
}

fn pad_block(width_um: f64, thickness_um: f64, bias: f64, metal: &str) -> Result<()> {
    let (w, d) = (width_um * UM, thickness_um * UM);
    let mesh = cube_mesh(5, 5, 3, w, w, d, |_| 0).context("building pad block mesh")?;
    let m = by_name(metal)?;
    let mut sys = System::new(mesh, &[m], ModelLevel::Ddm1)?;
    sys.add_boundary("zmax", BcType::SolderPad, Some(ExtCircuit::voltage(bias)))?;
    sys.add_boundary("zmin", BcType::SolderPad, Some(ExtCircuit::voltage(0.0)))?;
    sys.finalize();

    let comm = SerialComm;
    let params = SolveParams::default();
    let (_x, report) = solve_steady_state(&mut sys, &comm, &params)?;

    let current = sys.boundaries[0]
        .ext_circuit
        .as_ref()
        .map_or(0.0, |c| c.current);
    let analytic = m.conductance * w * w / d * bias;
    println!(
        "Pad block: {} iterations, I = {:.4e} A (sheet estimate {:.4e} A)",
        report.iterations,
        current.abs(),
        analytic
    );
    Ok(())
}

fn describe(bias: f64) -> Result<()> {
    let mut sys = diode_system(11, 1.0, 1.0e18, 1.0e18)?;
    if let Some(ckt) = sys.boundaries[0].ext_circuit.as_mut() {
        ckt.v_app = bias;
        ckt.potential = bias;
    }
    for bc in 0..sys.boundaries.len() {
        println!("{}", descriptor::emit(&sys, bc));
    }
    Ok(())
}

fn solve_spec() -> Result<()> {
    println!("nonlinear: newton basic linesearch trustregion");
    println!("linear:");
    for name in LINEAR_SOLVER_NAMES {
        let ls = linear_solver_type(name).context("table entry must parse")?;
        println!("  {name:<14} {:?}", linear_solver_category(ls));
    }
    println!("preconditioners:");
    for name in PRECONDITIONER_NAMES {
        println!("  {name}");
    }
    Ok(())
}
