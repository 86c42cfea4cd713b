pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(feature = "desktop")]
use tauri::Manager;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    if let Err(error) = try_run() {
        eprintln!("failed to launch application: {error}");
    }
}

#[cfg(feature = "desktop")]
fn try_run() -> Result<(), Box<dyn std::error::Error>> {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let handle = app.handle();

            let data_dir = handle
                .path()
                .app_data_dir()
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;
            std::fs::create_dir_all(&data_dir)?;

            crate::utils::logger::init_logging(&data_dir.join("logs"))
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

            let pool = crate::db::DbPool::in_dir(&data_dir)
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

            let state = crate::commands::AppState::new(pool)
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;
            crate::commands::notifications::spawn_snapshot_forwarder(handle.clone(), &state);
            app.manage(state);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            crate::commands::appraisal::appraisal_calculate,
            crate::commands::appraisal::appraisal_save,
            crate::commands::appraisal::appraisal_save_selected,
            crate::commands::appraisal::appraisal_list_saved,
            crate::commands::appraisal::appraisal_grade,
            crate::commands::kpi::kpi_tasks_list,
            crate::commands::kpi::kpi_tasks_create,
            crate::commands::kpi::kpi_tasks_update,
            crate::commands::kpi::kpi_tasks_delete,
            crate::commands::kpi::creator_roles_list,
            crate::commands::kpi::creator_roles_save,
            crate::commands::kpi::creator_roles_delete,
            crate::commands::kpi::weight_templates_list,
            crate::commands::kpi::weight_templates_save,
            crate::commands::kpi::weight_templates_delete,
            crate::commands::kpi::kpi_weight_edit,
            crate::commands::kpi::kpi_weight_from_template,
            crate::commands::kpi::kpi_assignments_list,
            crate::commands::kpi::kpi_assignments_submit,
            crate::commands::kpi::kpi_assignments_delete,
            crate::commands::review::reviews_list,
            crate::commands::review::reviews_get,
            crate::commands::review::reviews_update,
            crate::commands::compensation::compensations_list,
            crate::commands::compensation::compensations_save,
            crate::commands::compensation::compensations_delete,
            crate::commands::compensation::allowance_deductions_list,
            crate::commands::compensation::allowance_deductions_preview,
            crate::commands::compensation::allowance_deductions_import,
            crate::commands::directory::employees_list,
            crate::commands::directory::companies_list,
            crate::commands::directory::departments_list,
            crate::commands::notifications::notifications_start,
            crate::commands::notifications::notifications_stop,
            crate::commands::notifications::notifications_refresh,
            crate::commands::notifications::notifications_mark_read,
            crate::commands::settings::settings_get,
            crate::commands::settings::settings_update,
            crate::commands::settings::settings_clear_api_token,
        ])
        .run(tauri::generate_context!())?;

    Ok(())
}
