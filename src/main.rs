use anyhow::Context;
use clap::{CommandFactory, Parser};
use rand_ranlux::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODES: &str = "\
Tests:
   0  self consistency test, numbers equal the FORTRAN code
   1  sum of 10^9 floats, scalar generator
   2  sum of 10^9 floats, 4 lanes
   3  sum of 10^9 floats, 8 lanes
   4  skip 10^9 states, scalar generator
   5  skip 10^9 states, 4 lanes
   6  skip 10^9 states, 8 lanes
   7  same seed in every lane duplicates the scalar generator
   8  self consistency test with LCG skipping, numbers equal the FORTRAN code
   9  stream 32-bit words of the scalar generator to PATH
  10  RANLUX states transformed to LCG states match the LCG sequence
  11  LCG states transformed to RANLUX states match the RANLUX sequence
  12  time 2*10^9 LCG floats
  13  time 2*10^9 LCG doubles
  14  time 2*10^9 LCG floats generated in arrays
  15  time 2*10^9 LCG doubles generated in arrays
  16  stream 64-bit LCG state words to PATH

Example: rand_ranlux 9 >(RNG_test stdin32 -tlmax 32T)";

/// Tests and benchmarks of the RANLUX generators.
#[derive(Parser, Debug)]
#[command(name = "rand_ranlux", version, about, after_help = MODES)]
struct Cli {
    /// Test number
    ntest: Option<u32>,

    /// Output file for the streaming tests
    path: Option<PathBuf>,
}

fn usage() -> anyhow::Result<()> {
    Cli::command().print_help()?;
    Ok(())
}

fn simd_features() -> &'static str {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("avx2") {
            return "avx2";
        }
        if is_x86_feature_detected!("sse2") {
            return "sse2";
        }
    }
    "none"
}

const SEED: u32 = 3124;
const GIGA: u64 = 1_000_000_000;

fn sum_floats<G: Generator>(name: &str, mut rnd: G) {
    println!("Summing up {} random floats ({})...", GIGA, name);
    let start = Instant::now();
    // The sum saturates at 2^24 due to rounding.
    let mut sum = 0f32;
    for _ in 0 .. GIGA {
        sum += rnd.next_f32();
    }
    println!("sum={} in {:.3} s", sum, start.elapsed().as_secs_f64());
}

fn skip_states<G: Generator>(name: &str, mut rnd: G) {
    let (n, m) = (1_000_000, 1000);
    println!("Skipping {} states ({}, {} lanes)...", n * m, name, G::LANES);
    let start = Instant::now();
    for _ in 0 .. n {
        rnd.skip(m);
    }
    println!("Done in {:.3} s.", start.elapsed().as_secs_f64());
}

fn print_numbers<G: Generator>(rnd: &mut G) {
    let mut out = vec![0f32; 24 * G::LANES];
    rnd.fill_f32(&mut out);
    let line: Vec<String> = out.iter().map(|x| format!("{:.6}", x)).collect();
    println!("{}\n", line.join(" "));
}

fn same_seed() {
    let (n, m) = (1_000_000, 100);
    println!("Seed all lane generators with the same seed, they have to duplicate the scalar version.\n");

    let mut g1 = Ranlux::new(SEED);
    println!("Skipping {} states (scalar)...", n * m);
    for _ in 0 .. n { g1.skip(m); }
    print_numbers(&mut g1);

    let mut g2 = RanluxX4::with_seeding(SEED, scalar::DEFAULT_STRIDE, SeedMode::Same);
    println!("Skipping {} states (4 lanes)...", n * m);
    for _ in 0 .. n { g2.skip(m); }
    print_numbers(&mut g2);

    let mut g3 = RanluxX8::with_seeding(SEED, scalar::DEFAULT_STRIDE, SeedMode::Same);
    println!("Skipping {} states (8 lanes)...", n * m);
    for _ in 0 .. n { g3.skip(m); }
    print_numbers(&mut g3);
}

/// Reproduces the test program distributed with the FORTRAN code.
fn fortran_test<S: Skipper>() {
    let mut rvec = [0f32; 1000];
    let mut rnd = James::<S>::default();

    let mut print = |rnd: &mut James<S>, title: &str, luxury: &str| {
        println!("  {}", title);
        for range in ["  1-  5", "101-105"] {
            rnd.generate(&mut rvec[.. 100]);
            println!(" RANLUX {} {}:", luxury, range);
            let line: Vec<String> = rvec[.. 5].iter().map(|x| format!("{:10.8}", x)).collect();
            println!("{}", line.join(" "));
        }
    };

    print(&mut rnd, " CALL RANLUX(RVEC,100)", "default numbers");
    rnd.configure(0, 0, 0, 0);
    print(&mut rnd, " CALL RLUXGO(0,0,0,0)", "luxury level 0,");
    rnd.configure(389, 1, 0, 0);
    print(&mut rnd, " CALL RLUXGO(389,1,0,0)", "luxury p=389,");
    rnd.configure(75, 0, 0, 0);
    print(&mut rnd, " CALL RLUXGO(75,0,0,0)", "luxury p= 75,");

    println!("  test restarting from the full vector");
    let saved = rnd.save_state();
    println!("current RANLUX status saved:");
    for row in saved.0.chunks(5) {
        let line: String = row.iter().map(|x| format!("{:12}", x)).collect();
        println!("{}", line);
    }
    print(&mut rnd, "", "numbers");
    println!("   previous RANLUX status will be restored");
    if let Err(e) = rnd.restore_state(&saved) {
        println!("Test failed: {}", e);
        return;
    }
    print(&mut rnd, "", "numbers");

    println!("     test the restarting by skipping");
    rnd.configure(4, 7674985, 0, 0);
    let p = rnd.position();
    println!("  RLUXAT values = {} {} {} {}", p.luxury, p.seed, p.k1, p.k2);
    for _ in 0 .. 10 { rnd.generate(&mut rvec); }
    let p = rnd.position();
    println!("  RLUXAT values = {} {} {} {}", p.luxury, p.seed, p.k1, p.k2);
    rnd.generate(&mut rvec[.. 200]);
    println!("  Next and 200th numbers are: {:10.6} {:10.6}", rvec[0], rvec[199]);
    rnd.configure(p.luxury, p.seed, p.k1, p.k2);
    rnd.generate(&mut rvec[.. 200]);
    println!("  Next and 200th numbers are: {:10.6} {:10.6}", rvec[0], rvec[199]);
}

fn short_lcg(x: &U576) -> String {
    let l = x.limbs();
    format!("{:016x}{:016x} ... {:016x}{:016x}", l[8], l[7], l[1], l[0])
}

fn short_ranlux(y: &[u32; codec::WORDS], c: u32) -> String {
    format!("{:06x} {:06x} {:06x} ... {:06x} {:06x} {:06x} c={}", y[23], y[22], y[21], y[2], y[1], y[0], c)
}

/// Steps of the consistency checks.
const CHECK_STEPS: u32 = 100_000_000;

/// Checks the RANLUX sequence, mapped to the LCG domain, against the LCG sequence.
fn check_ranlux_to_lcg() {
    let stride = scalar::DEFAULT_STRIDE;
    let mut g0 = Ranlux::with_stride(100, stride);
    let (y, c) = g0.state();
    let mut g1 = Ranluxpp::from_ranlux(&y, c, g0.skip_distance());
    println!("Multiplier A = a^{} = {}", g1.skip_distance(), short_lcg(g1.multiplier()));
    println!("RANLUX: x_0 = {}", short_lcg(&g0.lcg_state()));
    println!("   LCG: x_0 = {}", short_lcg(g1.state()));

    let mut report = 1;
    for n in 1 .. CHECK_STEPS {
        g0.advance();
        g1.next_state();
        let x = g0.lcg_state();
        if &x != g1.state() {
            println!("Test failed at step {}.", n);
            println!("RANLUX: x_{} = {}", n, short_lcg(&x));
            println!("   LCG: x_{} = {}", n, short_lcg(g1.state()));
            return;
        }
        if n == report {
            report <<= 1;
            println!("RANLUX: x_{} = {}", n, short_lcg(&x));
            println!("   LCG: x_{} = {}", n, short_lcg(g1.state()));
        }
    }
    println!("Test successfully passed.");
    println!("The transformed RANLUX state and the LCG sequence are identical for {} steps.", CHECK_STEPS);
}

/// Checks the LCG sequence, mapped to the RANLUX domain, against the RANLUX sequence.
fn check_lcg_to_ranlux() {
    let stride = scalar::DEFAULT_STRIDE;
    let mut g0 = Ranlux::with_stride(100, stride);
    let (y, c) = g0.state();
    let mut g1 = Ranluxpp::from_ranlux(&y, c, g0.skip_distance());
    println!("Multiplier A = a^{} = {}", g1.skip_distance(), short_lcg(g1.multiplier()));

    let mut report = 1;
    for n in 1 .. CHECK_STEPS {
        g0.advance();
        g1.next_state();
        let (y, c) = g0.state();
        let (y2, c2) = g1.ranlux_state();
        if c != c2 {
            println!("Test failed at step {}. RANLUX carry bit = {}, LCG carry bit = {}", n, c, c2);
            return;
        }
        if let Some(j) = (0 .. codec::WORDS).find(|&j| y[j] != y2[j]) {
            println!("Test failed at step {}. RANLUX number y[{}]=0x{:x}, LCG number y[{}]=0x{:x}", n, j, y[j], j, y2[j]);
            return;
        }
        if n == report {
            report <<= 1;
            println!("RANLUX: y_{} = {}", n, short_ranlux(&y, c));
            println!("   LCG: y_{} = {}", n, short_ranlux(&y2, c2));
        }
    }
    println!("Test successfully passed.");
    println!("The transformed LCG state and the RANLUX sequence are identical for {} steps.", CHECK_STEPS);
}

const GIB: f64 = 1073741824.0;

fn time_numbers<T: Copy + Into<f64>>(kind: &str, bits: u32, mut next: impl FnMut() -> T) {
    let n = 2 * GIGA;
    println!("Generating {} {} random numbers...", n, kind);
    let start = Instant::now();
    let mut x = next();
    for _ in 1 .. n {
        x = next();
    }
    let seconds = start.elapsed().as_secs_f64();
    let gib = n as f64 * bits as f64 / 8.0 / GIB;
    println!("Time to generate {:.3} GiB is {:.3} s, speed is {:.3} GiB/s, last generated number is {}",
        gib, seconds, gib / seconds, x.into());
}

fn time_arrays<T: Copy + Default + Into<f64>>(kind: &str, bits: u32, mut fill: impl FnMut(&mut [T])) {
    const M: usize = 100;
    let n = 2 * GIGA / M as u64;
    println!("Generating {} {} random numbers from the array of size {}...", n * M as u64, kind, M);
    let mut xs = [T::default(); M];
    let start = Instant::now();
    for _ in 0 .. n {
        fill(&mut xs);
    }
    let seconds = start.elapsed().as_secs_f64();
    let sum: f64 = xs.iter().map(|&x| x.into()).sum();
    let gib = (n * M as u64) as f64 * bits as f64 / 8.0 / GIB;
    println!("Time to generate {:.3} GiB is {:.3} s, speed is {:.3} GiB/s, sum of last {} numbers is {}",
        gib, seconds, gib / seconds, M, sum);
}

/// Streams blocks of state words until the sink fails.
fn stream_ranlux(path: &Path) -> anyhow::Result<()> {
    const STEPS: usize = 2048;
    let file = std::fs::File::create(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut sink = WordSink::new(file);
    let mut rnd = Ranlux::new(SEED);
    let mut buffer = vec![0u32; generator::PACKED_WORDS * STEPS];
    info!(path = %path.display(), "streaming 32-bit words");
    let error = loop {
        for block in buffer.chunks_exact_mut(generator::PACKED_WORDS) {
            block.copy_from_slice(&rnd.next_state_words());
        }
        if let Err(e) = sink.write_u32s(&buffer) {
            break e;
        }
    };
    report_stream_end(error, sink.total());
    Ok(())
}

fn stream_lcg(path: &Path) -> anyhow::Result<()> {
    const STEPS: usize = 1024;
    let file = std::fs::File::create(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut sink = WordSink::new(file);
    let mut rnd = Ranluxpp::new(SEED as u64);
    let mut buffer = vec![0u64; lcg::LIMBS * STEPS];
    info!(path = %path.display(), "streaming 64-bit words");
    let error = loop {
        for block in buffer.chunks_exact_mut(lcg::LIMBS) {
            block.copy_from_slice(&rnd.next_state_words());
        }
        if let Err(e) = sink.write_u64s(&buffer) {
            break e;
        }
    };
    report_stream_end(error, sink.total());
    Ok(())
}

fn report_stream_end(error: Error, total: u64) {
    eprintln!("ERROR: {}", error);
    eprintln!("Total bytes written {}, {} GiB", total, total as f64 / GIB);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(());
        }
    };
    let Some(ntest) = cli.ntest else {
        return usage();
    };
    info!(arch = std::env::consts::ARCH, simd = simd_features(), "selected code path");

    match ntest {
        0 => fortran_test::<SwbSkip>(),
        1 => sum_floats("scalar", Ranlux::new(SEED)),
        2 => sum_floats("4 lanes", RanluxX4::new(SEED)),
        3 => sum_floats("8 lanes", RanluxX8::new(SEED)),
        4 => skip_states("scalar", Ranlux::new(SEED)),
        5 => skip_states("4 lanes", RanluxX4::new(SEED)),
        6 => skip_states("8 lanes", RanluxX8::new(SEED)),
        7 => same_seed(),
        8 => fortran_test::<LcgSkip>(),
        9 | 16 => {
            let Some(path) = cli.path else {
                return usage();
            };
            if ntest == 9 { stream_ranlux(&path)? } else { stream_lcg(&path)? }
        }
        10 => check_ranlux_to_lcg(),
        11 => check_lcg_to_ranlux(),
        12 => {
            let mut rnd = Ranluxpp::new(SEED as u64);
            time_numbers("f32", 24, || rnd.next_f32());
        }
        13 => {
            let mut rnd = Ranluxpp::new(SEED as u64);
            time_numbers("f64", 52, || rnd.next_f64());
        }
        14 => {
            let mut rnd = Ranluxpp::new(SEED as u64);
            time_arrays::<f32>("f32", 24, |xs| rnd.fill_f32(xs));
        }
        15 => {
            let mut rnd = Ranluxpp::new(SEED as u64);
            time_arrays::<f64>("f64", 52, |xs| rnd.fill_f64(xs));
        }
        _ => return usage(),
    }
    Ok(())
}
