//! Boxed plain-text rendering of a [`HardwareSnapshot`]

use crate::hardware::HardwareSnapshot;

const WIDTH: usize = 62;

fn format_line(label: &str, content: &str) -> String {
    let content_width = WIDTH.saturating_sub(1); // Leading space after "║"
    let label_len = label.chars().count();
    let available = content_width.saturating_sub(label_len);
    let content: String = content.chars().take(available).collect();
    format!("║ {label}{content:<available$}║\n")
}

fn separator() -> String {
    format!("╠{}╣\n", "═".repeat(WIDTH))
}

fn gib(bytes: i64) -> String {
    if bytes < 0 {
        return "unknown".to_string();
    }
    format!("{:.1} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

fn known(value: i64, unit: &str) -> String {
    if value < 0 {
        "unknown".to_string()
    } else {
        format!("{value} {unit}")
    }
}

/// Integer division that keeps the `-1` marker for unknown values
fn scaled(value: i64, divisor: i64) -> i64 {
    if value < 0 {
        value
    } else {
        value / divisor
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "unknown"
    } else {
        value
    }
}

/// Render every category of `snapshot` inside a box-drawing frame
pub fn render(snapshot: &HardwareSnapshot) -> String {
    let mut output = String::new();

    output.push_str(&format!("╔{}╗\n", "═".repeat(WIDTH)));
    output.push_str(&format!("║{:^WIDTH$}║\n", "SYSTEM INFORMATION"));
    output.push_str(&separator());

    // OS Section
    let os = &snapshot.os;
    output.push_str(&format_line("OS: ", &format!("{} {}", os.name, os.version)));
    output.push_str(&format_line("      ", &format!("Kernel: {}", or_unknown(&os.kernel))));
    let bits = if os.is_64_bit { "64-bit" } else { "32-bit" };
    let endian = if os.is_little_endian {
        "little endian"
    } else {
        "big endian"
    };
    output.push_str(&format_line("      ", &format!("{bits}, {endian}")));

    output.push_str(&separator());

    // CPU Section
    if snapshot.cpus.is_empty() {
        output.push_str(&format_line("CPU: ", "none detected"));
    }
    for cpu in &snapshot.cpus {
        output.push_str(&format_line(
            &format!("CPU {}: ", cpu.id),
            or_unknown(&cpu.model_name),
        ));
        output.push_str(&format_line(
            "      ",
            &format!(
                "{} cores / {} threads",
                cpu.num_physical_cores, cpu.num_logical_cores
            ),
        ));
        output.push_str(&format_line(
            "      ",
            &format!(
                "Base Clock: {}, Max Clock: {}",
                known(cpu.regular_clock_speed_mhz, "MHz"),
                known(cpu.max_clock_speed_mhz, "MHz")
            ),
        ));
        output.push_str(&format_line(
            "      ",
            &format!("L3 Cache: {}", known(scaled(cpu.l3_cache_size_bytes, 1024), "KiB")),
        ));
        if let Some(sample) = snapshot.cpu_samples.iter().find(|s| s.cpu_id == cpu.id) {
            output.push_str(&format_line(
                "      ",
                &format!("Utilization: {:.1}%", sample.utilization * 100.0),
            ));
        }
    }

    output.push_str(&separator());

    // GPU Section
    if snapshot.gpus.is_empty() {
        output.push_str(&format_line("GPU: ", "none detected"));
    }
    for gpu in &snapshot.gpus {
        output.push_str(&format_line(&format!("GPU {}: ", gpu.id), &gpu.name));
        if gpu.memory_bytes >= 0 {
            output.push_str(&format_line("      ", &format!("VRAM: {}", gib(gpu.memory_bytes))));
        }
        if !gpu.driver_version.is_empty() {
            output.push_str(&format_line(
                "      ",
                &format!("Driver: {}", gpu.driver_version),
            ));
        }
    }

    output.push_str(&separator());

    // Memory Section
    let memory = &snapshot.memory;
    output.push_str(&format_line(
        "RAM: ",
        &format!(
            "{} total, {} available",
            gib(memory.total_bytes),
            gib(memory.available_bytes)
        ),
    ));
    for module in &memory.modules {
        output.push_str(&format_line(
            "      ",
            &format!(
                "{}: {} {} @ {}",
                module.name,
                gib(module.total_bytes),
                module.vendor,
                known(scaled(module.frequency_hz, 1_000_000), "MT/s")
            ),
        ));
    }

    let board = &snapshot.mainboard;
    output.push_str(&format_line(
        "Board: ",
        &format!("{} {}", or_unknown(&board.vendor), board.name),
    ));

    output.push_str(&separator());

    // Storage Section
    for disk in &snapshot.disks {
        output.push_str(&format_line(
            &format!("Disk {}: ", disk.id),
            or_unknown(&disk.model),
        ));
        output.push_str(&format_line(
            "      ",
            &format!(
                "{} free of {}",
                gib(disk.free_size_bytes),
                gib(disk.size_bytes)
            ),
        ));
        if !disk.volumes.is_empty() {
            output.push_str(&format_line("      ", &disk.volumes.join(", ")));
        }
    }
    for battery in &snapshot.batteries {
        let state = if battery.charging { "charging" } else { "discharging" };
        output.push_str(&format_line(
            &format!("Battery {}: ", battery.id),
            &format!(
                "{} {} mWh / {} mWh, {state}",
                battery.model, battery.energy_now_mwh, battery.energy_full_mwh
            ),
        ));
    }
    for network in &snapshot.networks {
        output.push_str(&format_line(
            "Net: ",
            &format!(
                "{} ({}) {}",
                network.description,
                network.mac_address,
                or_unknown(&network.ipv4_address)
            ),
        ));
    }

    output.push_str(&format!("╚{}╝\n", "═".repeat(WIDTH)));

    output
}
