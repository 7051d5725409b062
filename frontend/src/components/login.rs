use crate::auth::{login, use_auth};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;
use sensordash_shared::form::{FieldState, LoginForm};
use sensordash_shared::validation::Field;

pub const LOGIN_ERROR_MESSAGE: &str = "Login failed. Please check your information and try again.";

/// 单个输入框：输入时按 touched 状态实时校验，失焦时无条件校验
#[component]
fn LoginField(
    form: RwSignal<LoginForm>,
    field: Field,
    id: &'static str,
    input_type: &'static str,
    placeholder: &'static str,
) -> impl IntoView {
    let value = move || {
        form.with(|f| f.field(field).map(|s| s.value().to_string()).unwrap_or_default())
    };
    let error = move || form.with(|f| f.field(field).and_then(FieldState::error_message));
    let has_error = move || error().is_some();

    view! {
        <div class="form-control">
            <label class="label" for=id>
                <span class="label-text">{field.label()}</span>
            </label>
            <input
                id=id
                type=input_type
                placeholder=placeholder
                class="input input-bordered"
                class:input-error=has_error
                prop:value=value
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    form.update(|f| {
                        if let Some(state) = f.field_mut(field) {
                            state.input(value);
                        }
                    });
                }
                on:blur=move |_| {
                    form.update(|f| {
                        if let Some(state) = f.field_mut(field) {
                            state.blur();
                        }
                    });
                }
            />
            <Show when=has_error>
                <label class="label">
                    <span class="label-text-alt text-error">{error}</span>
                </label>
            </Show>
        </div>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();

    let form = RwSignal::new(LoginForm::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<&'static str>::None);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        if is_submitting.get_untracked() {
            return;
        }

        let mut valid = false;
        form.update(|f| valid = f.submit());
        if !valid {
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let identity = form.with_untracked(LoginForm::identity);
        let api = auth.api();
        spawn_local(async move {
            // 成功后会话事件更新认证信号，路由服务负责跳转
            if let Err(e) = login(&api, identity).await {
                error!("[Login] login failed: {}", e);
                set_error_msg.set(Some(LOGIN_ERROR_MESSAGE));
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Sensor Dashboard"</h1>
                    <p class="text-base-content/70">"Enter your details to continue"</p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit novalidate>
                        <Show when=move || error_msg.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>

                        <LoginField
                            form=form
                            field=Field::Email
                            id="email"
                            input_type="email"
                            placeholder="you@example.com"
                        />
                        <LoginField
                            form=form
                            field=Field::FirstName
                            id="firstName"
                            input_type="text"
                            placeholder="Ada"
                        />
                        <LoginField
                            form=form
                            field=Field::LastName
                            id="lastName"
                            input_type="text"
                            placeholder="Lovelace"
                        />

                        <div class="form-control mt-6">
                            <button type="submit" class="btn btn-primary" disabled=move || is_submitting.get() || !form.with(LoginForm::can_submit)>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Logging in..." }.into_any()
                                } else {
                                    "Login / Register".into_any()
                                }}
                            </button>
                        </div>
                    </form>
                </div>
            </div>
        </div>
    }
}
