use muxpanel::{decode, ChannelBank, LiveHistory, Reconciler, SideEffects, SseDecoder};

// Offline replay of a canned progress stream.
//
// Feeds a short two-channel, two-pass run through the same decode and
// reconcile path the console uses and prints what each frame decided:
// phase transitions, channel markers, ring quartiles, the end-of-run
// summary. No backend and no window, so it also runs with
// --no-default-features.
//
// The feed deliberately contains the awkward cases the stream produces in
// the field: a frame re-delivered byte-for-byte after a network retry, a
// frame split mid-JSON across two chunks, a comment keepalive, and gas
// readings piggybacked on a SWITCHING frame.
//
// Usage:
//   cargo run --example replay --no-default-features

const FEED: &[&[u8]] = &[
    // Baseline before the run; device state piggybacks on the first frame.
    b"data: {\"phase\":\"IDLE\",\"connection\":{\"online\":true},\"usb_mounted\":true}\n\n",
    // Run starts on channel 1 (wire index 0), two channels x two passes.
    b"data: {\"phase\":\"MEASURING\",\"current_channel\":0,\"repeat_index\":0,\"repeat_total\":2,\"percent\":8.0,\"overall_percent\":2.0,\"step_index\":0,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":8.0,\"tt_seconds\":392.0,\"next_channel\":4}\n\n",
    // The same frame again, as a flaky proxy would re-deliver it.
    b"data: {\"phase\":\"MEASURING\",\"current_channel\":0,\"repeat_index\":0,\"repeat_total\":2,\"percent\":8.0,\"overall_percent\":2.0,\"step_index\":0,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":8.0,\"tt_seconds\":392.0,\"next_channel\":4}\n\n",
    // Mid-sample tick: nothing transitions, only the rings move.
    b"data: {\"phase\":\"MEASURING\",\"current_channel\":0,\"percent\":64.0,\"overall_percent\":16.0,\"step_index\":0,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":64.0,\"tt_seconds\":336.0,\"next_channel\":4}\n\n",
    // Sample done, valve switching; readings arrive with it. The frame is
    // split mid-JSON across two chunks.
    b"data: {\"phase\":\"SWITCHING\",\"current_channel\":0,\"next_channel\":4,\"percent\":100.0,\"overall_percent\":25.0,\"step_index\":1,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":100.0,\"tt_seconds\":300.0,\"live_data\":{\"timestamp\":\"2026-08-25 10:14:05\",\"phase\":\"SWITCHING\",\"channel\":1,\"repeat\":1,\"components\":[{\"label\":\"CH4\",\"ppm\":1.94,\"cas\":\"74-82-8\"},{\"label\":\"CO2\",\"ppm\":4",
    b"21.3,\"cas\":\"124-38-9\"}]}}\n\n",
    b"data: {\"phase\":\"MEASURING\",\"current_channel\":4,\"percent\":5.0,\"overall_percent\":27.0,\"step_index\":1,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":105.0,\"tt_seconds\":295.0,\"next_channel\":0}\n\n",
    b"data: {\"phase\":\"SWITCHING\",\"current_channel\":4,\"next_channel\":0,\"percent\":100.0,\"overall_percent\":50.0,\"step_index\":2,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":200.0,\"tt_seconds\":200.0,\"live_data\":{\"timestamp\":\"2026-08-25 10:15:45\",\"phase\":\"SWITCHING\",\"channel\":5,\"repeat\":1,\"components\":[{\"label\":\"CH4\",\"ppm\":2.11,\"cas\":\"74-82-8\"},{\"label\":\"CO2\",\"ppm\":430.8,\"cas\":\"124-38-9\"}]}}\n\n",
    // Second pass lands back on channel 1: markers reset.
    b"data: {\"phase\":\"MEASURING\",\"current_channel\":0,\"repeat_index\":1,\"repeat_total\":2,\"percent\":4.0,\"overall_percent\":51.0,\"step_index\":2,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":204.0,\"tt_seconds\":196.0,\"next_channel\":4}\n\n",
    b"data: {\"phase\":\"SWITCHING\",\"current_channel\":0,\"next_channel\":4,\"percent\":100.0,\"overall_percent\":75.0,\"step_index\":3,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":300.0,\"tt_seconds\":100.0,\"live_data\":{\"timestamp\":\"2026-08-25 10:17:25\",\"phase\":\"SWITCHING\",\"channel\":1,\"repeat\":2,\"components\":[{\"label\":\"CH4\",\"ppm\":1.87,\"cas\":\"74-82-8\"},{\"label\":\"CO2\",\"ppm\":419.6,\"cas\":\"124-38-9\"}]}}\n\n",
    b"data: {\"phase\":\"MEASURING\",\"current_channel\":4,\"percent\":6.0,\"overall_percent\":77.0,\"step_index\":3,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":306.0,\"tt_seconds\":94.0,\"next_channel\":0}\n\n",
    b"data: {\"phase\":\"SWITCHING\",\"current_channel\":4,\"next_channel\":0,\"percent\":100.0,\"overall_percent\":100.0,\"step_index\":4,\"total_steps\":4,\"enabled_count\":2,\"elapsed_seconds\":400.0,\"tt_seconds\":0.0,\"live_data\":{\"timestamp\":\"2026-08-25 10:19:05\",\"phase\":\"SWITCHING\",\"channel\":5,\"repeat\":2,\"components\":[{\"label\":\"CH4\",\"ppm\":2.05,\"cas\":\"74-82-8\"},{\"label\":\"CO2\",\"ppm\":428.1,\"cas\":\"124-38-9\"}]}}\n\n",
    // Keepalive comment, then the run settles: SWITCHING straight into
    // IDLE is the completion signal. The collected marks stay up.
    b": keepalive\n\ndata: {\"phase\":\"IDLE\",\"current_channel\":4,\"total_steps\":4,\"overall_percent\":100.0}\n\n",
];

fn main() {
    let mut decoder = SseDecoder::new();
    let mut reconciler = Reconciler::new();
    let mut bank = ChannelBank::new();
    let mut history = LiveHistory::new(600, 200);

    // Select channels 1 and 5 the way an operator would.
    bank.set_all(false);
    bank.toggle(0);
    bank.toggle(4);
    eprintln!(
        "[replay] {} of 31 channels selected, feeding {} chunks",
        bank.selected_count(),
        FEED.len()
    );

    let mut frame_no = 0usize;
    for chunk in FEED {
        for payload in decoder.push(chunk) {
            frame_no += 1;
            let Some(event) = decode(&payload) else {
                println!("frame {frame_no:>2}  dropped (payload did not parse)");
                continue;
            };
            if let Some(block) = &event.live_data {
                history.push(block);
            }
            let fx = reconciler.reconcile(&event, &mut bank);
            describe(frame_no, &fx, &bank);
        }
    }

    println!();
    println!("{} gas readings logged:", history.row_count());
    for series in history.series() {
        let last = series.points.back().map(|p| p[1]).unwrap_or(f64::NAN);
        println!(
            "  {:<4} {} points, last {:.2} ppm",
            series.label,
            series.points.len(),
            last
        );
    }
}

fn describe(frame_no: usize, fx: &SideEffects, bank: &ChannelBank) {
    let snap = &fx.snapshot;
    println!(
        "frame {:>2}  {:<9} ch {:>2}  step {}/{}  cycle {:>4} {:?}  overall {:>4} {:?}",
        frame_no,
        snap.phase.as_str(),
        snap.channel + 1,
        snap.step_index,
        snap.total_steps,
        fx.rings.cycle.label,
        fx.rings.cycle.quartile,
        fx.rings.overall.label,
        fx.rings.overall.quartile,
    );
    if let Some(change) = fx.phase_change {
        let from = change.from.map(|p| p.as_str()).unwrap_or("(start)");
        println!("          phase {} -> {}", from, change.to.as_str());
    }
    if fx.fresh_pass {
        println!("          fresh pass: channel markers cleared");
    }
    if fx.phase_change.is_some() || fx.fresh_pass {
        println!("          markers: {}", markers(bank));
    }
    if let Some(summary) = &fx.summary {
        println!("          summary: {}", summary.body());
    }
    if fx.phase_change.is_none() && !fx.channel_changed {
        println!("          no transitions; rings recomputed only");
    }
}

/// Non-idle markers as `ch<n>:<marker>`, or `(all idle)`.
fn markers(bank: &ChannelBank) -> String {
    let marked: Vec<String> = (0..muxpanel::CHANNEL_COUNT)
        .filter_map(|idx| {
            let visual = bank.visual(idx);
            (visual != muxpanel::ChannelVisual::Idle)
                .then(|| format!("ch{}:{:?}", idx + 1, visual))
        })
        .collect();
    if marked.is_empty() {
        "(all idle)".to_string()
    } else {
        marked.join(" ")
    }
}
