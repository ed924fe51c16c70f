use console::Style;
use framepulse_core::config::JobConfig;
use framepulse_core::engine::SumResult;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

pub fn print_job_summary(config: &JobConfig) {
    let s = Styles::new();
    let ds = &config.dataset;

    println!();
    println!("  {}", s.title.apply_to("framepulse"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(10)));
    println!();

    println!("  {}", s.header.apply_to("Dataset"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(ds.frames)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Signal"),
        s.value.apply_to(format!("{}x{}", ds.sig_height, ds.sig_width))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Units"),
        s.value.apply_to(ds.partitions)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tile"),
        s.value.apply_to(format!("{} frames", ds.tile_frames))
    );
    if ds.roi_fraction < 1.0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("ROI"),
            s.value.apply_to(format!("{:.0}%", ds.roi_fraction * 100.0))
        );
    }
    if config.tile_delay_ms > 0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Delay"),
            s.value.apply_to(format!("{} ms/tile", config.tile_delay_ms))
        );
    }
    println!();

    let progress = &config.progress;
    if progress.enabled {
        println!("  {}", s.header.apply_to("Progress"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Threshold"),
            s.value.apply_to(format!("{} s", progress.threshold_part_time_secs))
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Interval"),
            s.value.apply_to(format!("{} s", progress.min_message_interval_secs))
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Progress"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}

pub fn print_run_summary(result: &SumResult) {
    let s = Styles::new();
    let summary = &result.summary;
    let secs = summary.elapsed.as_secs_f64();

    println!();
    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Units"),
        s.value.apply_to(summary.units)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(summary.frames)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Elapsed"),
        s.value.apply_to(format!("{secs:.2} s"))
    );
    if secs > 0.0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Rate"),
            s.value
                .apply_to(format!("{:.0} frames/s", summary.frames as f64 / secs))
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Sum"),
        s.value.apply_to(format!("{:.4e}", result.intensity.sum()))
    );
    if let Some(ref progress) = summary.progress {
        println!(
            "    {:<12}{} ({}/{})",
            s.label.apply_to("Progress"),
            s.value.apply_to(&progress.description),
            progress.position,
            progress.total
        );
    }
    println!();
}
