use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{AccessGrant, PlatformRole, ProjectRole};
use crate::models;
use crate::routes::{self, health::HealthStatus};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::auth::register,
		routes::auth::login,
		routes::auth::refresh_token,
		routes::auth::verify_email,
		routes::auth::forgot_password,
		routes::auth::reset_password,
		routes::auth::logout,
		routes::auth::current_user,
		routes::auth::change_password,
		routes::auth::resend_email_verification,
		routes::projects::list_projects,
		routes::projects::create_project,
		routes::projects::get_project,
		routes::projects::update_project,
		routes::projects::delete_project,
		routes::members::list_members,
		routes::members::add_member,
		routes::members::update_member,
		routes::members::remove_member,
		routes::tasks::list_tasks,
		routes::tasks::create_task,
		routes::tasks::get_task,
		routes::tasks::update_task,
		routes::tasks::delete_task,
		routes::subtasks::list_subtasks,
		routes::subtasks::create_subtask,
		routes::subtasks::update_subtask,
		routes::subtasks::delete_subtask,
		routes::notes::list_notes,
		routes::notes::create_note,
		routes::notes::get_note,
		routes::notes::update_note,
		routes::notes::delete_note,
		routes::health::healthcheck
	),
	components(
		schemas(
			models::user::User,
			models::user::UserProfile,
			models::user::RegisterMetadata,
			models::user::RegisterRequest,
			models::user::LoginRequest,
			models::user::RefreshRequest,
			models::user::EmailRequest,
			models::user::ResendVerificationRequest,
			models::user::ResetPasswordRequest,
			models::user::ChangePasswordRequest,
			models::user::Session,
			models::user::RegisteredUser,
			models::user::CurrentUser,
			models::project::Project,
			models::project::ProjectDetail,
			models::project::ProjectCreateRequest,
			models::project::ProjectUpdateRequest,
			models::member::ProjectMember,
			models::member::AddMemberRequest,
			models::member::UpdateMemberRequest,
			models::task::Task,
			models::task::TaskWithSubtasks,
			models::task::TaskCreateRequest,
			models::task::TaskUpdateRequest,
			models::subtask::Subtask,
			models::subtask::SubtaskCreateRequest,
			models::subtask::SubtaskUpdateRequest,
			models::note::Note,
			models::note::NoteCreateRequest,
			models::note::NoteUpdateRequest,
			AccessGrant,
			PlatformRole,
			ProjectRole,
			HealthStatus
		)
	),
	tags(
		(name = "Auth", description = "Registration, sessions and credentials"),
		(name = "Projects", description = "Project management"),
		(name = "Members", description = "Project membership and roles"),
		(name = "Tasks", description = "Task management"),
		(name = "Subtasks", description = "Checklist items under a task"),
		(name = "Notes", description = "Project notes and decisions"),
		(name = "Health", description = "Liveness probe")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc)?;
	ensure_global_security(&mut doc)?;
	add_examples(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc).context("OpenAPI serialization failed")?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn root_object(doc: &mut Value) -> anyhow::Result<&mut Map<String, Value>> {
	doc.as_object_mut().context("OpenAPI root must be an object")
}

fn ensure_security_components(doc: &mut Value) -> anyhow::Result<()> {
	let components = root_object(doc)?
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.context("components must be an object")?;

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.context("securitySchemes must be an object")?;

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);

	Ok(())
}

// Operations annotated with `security(())` keep their empty override.
fn ensure_global_security(doc: &mut Value) -> anyhow::Result<()> {
	root_object(doc)?
		.entry("security")
		.or_insert_with(|| json!([{ "bearerAuth": [] }]));
	Ok(())
}

fn add_examples(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		for item in paths.values_mut() {
			if let Some(operations) = item.as_object_mut() {
				for operation in operations.values_mut() {
					apply_parameter_examples(operation);
					apply_request_examples(operation);
				}
			}
		}
	}
}

fn apply_parameter_examples(operation: &mut Value) {
	let Some(parameters) = operation.get_mut("parameters").and_then(Value::as_array_mut) else { return; };

	for parameter in parameters.iter_mut() {
		let is_path_id = parameter.get("in").and_then(Value::as_str) == Some("path")
			&& parameter
				.get("name")
				.and_then(Value::as_str)
				.map(|name| name.ends_with("_id"))
				.unwrap_or(false);

		if is_path_id {
			if let Some(obj) = parameter.as_object_mut() {
				obj.entry("example")
					.or_insert_with(|| json!("00000000-0000-0000-0000-000000000000"));
			}
		}
	}
}

fn apply_request_examples(operation: &mut Value) {
	let Some(request_body) = operation.get_mut("requestBody") else { return; };
	let Some(content) = request_body.get_mut("content").and_then(Value::as_object_mut) else { return; };
	let Some(app_json) = content.get_mut("application/json").and_then(Value::as_object_mut) else { return; };
	let Some(schema) = app_json.get("schema").and_then(Value::as_object) else { return; };
	let Some(reference) = schema.get("$ref").and_then(Value::as_str) else { return; };

	let example = match reference {
		"#/components/schemas/RegisterRequest" => Some(json!({
			"email": "ada@example.com",
			"password": "S3cureP@ssw0rd",
			"metadata": { "full_name": "Ada Lovelace" }
		})),
		"#/components/schemas/ProjectCreateRequest" => Some(json!({
			"name": "Launch Planning",
			"description": "Prepare milestones for the product launch.",
			"start_date": "2025-10-01",
			"target_end_date": "2025-12-15"
		})),
		"#/components/schemas/AddMemberRequest" => Some(json!({
			"user_id": "11111111-1111-1111-1111-111111111111",
			"role": "member"
		})),
		"#/components/schemas/TaskCreateRequest" => Some(json!({
			"title": "Define launch checklist",
			"priority": "high",
			"is_critical": true,
			"due_date": "2025-10-10T10:00:00Z"
		})),
		"#/components/schemas/NoteCreateRequest" => Some(json!({
			"title": "Hosting decision",
			"content": "We go with the managed database.",
			"category": "architecture",
			"tags": ["infra", "db"],
			"is_decision": true
		})),
		_ => None,
	};

	if let Some(example) = example {
		app_json.insert("example".to_string(), example);
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	// CERT_PATH and KEY_PATH switch the server to TLS, so Try-it-out must follow.
	let tls_enabled = std::env::var("CERT_PATH").is_ok() && std::env::var("KEY_PATH").is_ok();
	let scheme = if tls_enabled { "https" } else { "http" };
	let server_url = format!("{}://localhost:{}", scheme, port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr
				.iter()
				.any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn path_ids_get_an_example() {
		let mut operation = json!({
			"parameters": [
				{ "name": "project_id", "in": "path" },
				{ "name": "status", "in": "query" }
			]
		});
		apply_parameter_examples(&mut operation);

		assert!(operation["parameters"][0].get("example").is_some());
		assert!(operation["parameters"][1].get("example").is_none());
	}

	#[test]
	fn servers_entry_is_not_duplicated() {
		let mut doc = json!({});
		ensure_servers(&mut doc, 9000);
		ensure_servers(&mut doc, 9000);
		assert_eq!(doc["servers"].as_array().map(Vec::len), Some(1));
	}
}
