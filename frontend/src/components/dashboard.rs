use crate::auth::{logout, use_auth};
use crate::chart::{ChartSpec, render_to_canvas};
use crate::flow::{DashboardState, load_reading, submit_analysis};
use crate::web::CanvasSnapshot;
use leptos::html::Canvas;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;
use sensordash_shared::validation::DESCRIPTION_MAX_LEN;
use std::time::Duration;

const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();

    let state = RwSignal::new(DashboardState::new());
    let canvas_ref = NodeRef::<Canvas>::new();
    let (chart_rendered, set_chart_rendered) = signal(false);

    let load = move || {
        if state.with_untracked(DashboardState::is_loading) {
            return;
        }
        state.update(DashboardState::begin_load);
        let api = auth.api();
        spawn_local(async move {
            let result = load_reading(&api).await;
            state.update(|s| s.finish_load(result));
        });
    };

    // 初始加载
    Effect::new(move |_| load());

    // 只在读数变化时重绘，输入描述不触发
    let reading_revision = Memo::new(move |_| state.with(|s| s.reading_revision));

    Effect::new(move |_| {
        reading_revision.track();
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let Some(spec) = state.with_untracked(|s| s.reading.as_ref().map(ChartSpec::for_reading)) else {
            return;
        };
        match render_to_canvas(canvas, &spec) {
            Ok(()) => set_chart_rendered.set(true),
            Err(e) => {
                warn!("[Dashboard] failed to render chart: {}", e);
                set_chart_rendered.set(false);
            }
        }
    });

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();

        let identity = auth.identity.get_untracked();
        let mut pending = None;
        state.update(|s| pending = s.begin_submit(identity.as_ref()));
        let Some(pending) = pending else {
            return;
        };

        let snapshot = CanvasSnapshot::new(canvas_ref.get_untracked(), chart_rendered.get_untracked());
        let api = auth.api();
        spawn_local(async move {
            let result = submit_analysis(&api, pending, &snapshot).await;
            let mut reload = false;
            state.update(|s| reload = s.finish_submit(result));
            if reload {
                set_timeout(move || state.update(DashboardState::dismiss_notice), NOTICE_DURATION);
                load();
            }
        });
    };

    let on_logout = move |_| logout(&auth);

    let welcome = move || {
        auth.identity
            .get()
            .map(|user| format!("Welcome, {}", user.display_name()))
            .unwrap_or_default()
    };
    let is_loading = move || state.with(DashboardState::is_loading);
    let has_reading = move || state.with(|s| s.reading.is_some());
    let description_error = move || state.with(|s| s.form.description.error_message());

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-5xl mx-auto space-y-6">
                <Show when=move || state.with(|s| s.success_notice().is_some())>
                    <div class="toast toast-top toast-end z-50">
                        <div class="alert alert-success shadow-lg">
                            <span>{move || state.with(|s| s.success_notice().unwrap_or_default())}</span>
                        </div>
                    </div>
                </Show>

                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 flex-col items-start px-2">
                        <span class="text-xl font-bold">"Sensor Data Dashboard"</span>
                        <span class="text-sm text-base-content/70">{welcome}</span>
                    </div>
                    <div class="flex-none">
                        <button on:click=on_logout class="btn btn-outline btn-error">
                            "Logout"
                        </button>
                    </div>
                </div>

                <Show when=move || state.with(|s| s.load_error().is_some())>
                    <div role="alert" class="alert alert-error">
                        <span>{move || state.with(|s| s.load_error().unwrap_or_default())}</span>
                        <button class="btn btn-sm" on:click=move |_| load()>"Retry"</button>
                    </div>
                </Show>

                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body">
                        <div class="flex items-center justify-between">
                            <h2 class="card-title">"Sensor Readings"</h2>
                            <button
                                class="btn btn-primary btn-sm"
                                on:click=move |_| load()
                                disabled=is_loading
                            >
                                {move || if is_loading() { "Loading..." } else { "Load New Data" }}
                            </button>
                        </div>

                        <Show when=has_reading fallback=move || view! {
                            <div class="text-center py-16 text-base-content/50">
                                {move || if is_loading() {
                                    view! { <span class="loading loading-spinner loading-md"></span> " Loading sensor data..." }.into_any()
                                } else {
                                    "No sensor data available".into_any()
                                }}
                            </div>
                        }>
                            <div class="stats stats-vertical md:stats-horizontal shadow">
                                <div class="stat">
                                    <div class="stat-title">"Timestamp"</div>
                                    <div class="stat-value text-lg">
                                        {move || state.with(|s| s.reading.as_ref().map(|r| r.formatted_timestamp()).unwrap_or_default())}
                                    </div>
                                </div>
                                <div class="stat">
                                    <div class="stat-title">"Line Number"</div>
                                    <div class="stat-value text-lg">
                                        {move || state.with(|s| s.reading.as_ref().map(|r| r.line_number).unwrap_or_default())}
                                    </div>
                                </div>
                                <div class="stat">
                                    <div class="stat-title">"Data Points"</div>
                                    <div class="stat-value text-lg">
                                        {move || state.with(|s| s.reading.as_ref().map(|r| r.points.len()).unwrap_or_default())}
                                    </div>
                                </div>
                            </div>
                            <div class="w-full overflow-x-auto">
                                <canvas node_ref=canvas_ref width="800" height="400" class="w-full"></canvas>
                            </div>
                        </Show>
                    </div>
                </div>

                <div class="card bg-base-100 shadow-xl">
                    <form class="card-body" on:submit=on_submit novalidate>
                        <h2 class="card-title">"Analysis"</h2>

                        <Show when=move || state.with(|s| s.submit_error().is_some())>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || state.with(|s| s.submit_error().unwrap_or_default())}</span>
                            </div>
                        </Show>

                        <textarea
                            id="description"
                            rows="5"
                            class="textarea textarea-bordered w-full"
                            class:textarea-error=move || description_error().is_some()
                            placeholder="Describe what you observe in the sensor data..."
                            prop:value=move || state.with(|s| s.form.description.value().to_string())
                            on:input=move |ev| {
                                let value = event_target_value(&ev);
                                state.update(|s| s.form.description.input(value));
                            }
                            on:blur=move |_| state.update(|s| s.form.description.blur())
                        ></textarea>

                        <div class="flex justify-between text-sm">
                            <span class="text-error">{description_error}</span>
                            <span class="text-base-content/60">
                                {move || format!("{}/{} characters", state.with(|s| s.form.char_count()), DESCRIPTION_MAX_LEN)}
                                <Show when=move || state.with(|s| s.form.needs_more_chars())>
                                    " (minimum 10 required)"
                                </Show>
                            </span>
                        </div>

                        <div class="card-actions justify-end">
                            <button
                                type="submit"
                                class="btn btn-primary"
                                disabled=move || !state.with(DashboardState::can_submit)
                            >
                                {move || if state.with(DashboardState::is_submitting) {
                                    view! { <span class="loading loading-spinner"></span> "Submitting..." }.into_any()
                                } else {
                                    "Submit Analysis".into_any()
                                }}
                            </button>
                        </div>
                    </form>
                </div>
            </div>
        </div>
    }
}
