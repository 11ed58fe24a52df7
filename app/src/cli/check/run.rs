use anyhow::Result;
use xr_config::forward::resolve;
use xr_config::{forwarding_records, Fragment, InboundRecord, InboundStore};

use super::args::CheckArgs;
use super::types::{push_err, push_warn, CheckIssue, CheckReport, CheckSummary, IssueCode, IssueKind};
use crate::cli::{EXIT_INVALID, EXIT_OK};
use crate::store::JsonFileStore;

/// Returns the exit code: 0 no errors, 2 errors (or warnings with `--strict`).
pub fn run(args: CheckArgs) -> Result<i32> {
    let file = args.inbounds.display().to_string();
    let mut issues = Vec::new();

    let records = match JsonFileStore::new(&args.inbounds).inbounds() {
        Ok(r) => r,
        Err(e) => {
            push_err(&mut issues, e.code(), String::new(), e.to_string(), None);
            Vec::new()
        }
    };
    for (i, record) in records.iter().enumerate() {
        check_record(i, record, &mut issues);
    }

    let errors = issues.iter().filter(|i| i.kind == IssueKind::Error).count();
    let warnings = issues.len() - errors;
    let ok = errors == 0 && !(args.strict && warnings > 0);
    let report = CheckReport {
        ok,
        file,
        summary: CheckSummary {
            records: records.len(),
            enabled: records.iter().filter(|r| r.enable).count(),
            forwarding: forwarding_records(&records).len(),
            errors,
            warnings,
        },
        issues,
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }
    Ok(if ok { EXIT_OK } else { EXIT_INVALID })
}

fn check_record(index: usize, record: &InboundRecord, issues: &mut Vec<CheckIssue>) {
    if !record.enable {
        return;
    }
    let tag = record.listener_tag();

    // a resolved, enabled forward gets a proxySettings reference in settings
    let forwarded = match resolve(&record.forward) {
        Ok(spec) => spec.enabled,
        Err(e) => {
            push_err(
                issues,
                e.code(),
                format!("/{index}/{}", forward_key(e.field())),
                e.to_string(),
                Some(tag.as_ref()),
            );
            false
        }
    };

    for (key, text) in [
        ("settings", &record.settings),
        ("streamSettings", &record.stream_settings),
        ("sniffing", &record.sniffing),
    ] {
        match Fragment::parse(text) {
            Ok(Some(frag)) if key == "settings" && forwarded && !frag.is_object() => push_err(
                issues,
                IssueCode::TypeMismatch,
                format!("/{index}/{key}"),
                "settings must be an object to carry the forward reference".into(),
                Some(tag.as_ref()),
            ),
            Ok(_) => {}
            Err(e) => push_err(
                issues,
                IssueCode::FragmentInvalid,
                format!("/{index}/{key}"),
                format!("{key} is not valid JSON: {e}"),
                Some(tag.as_ref()),
            ),
        }
    }

    let fw = &record.forward;
    let user = fw.username.as_deref().is_some_and(|s| !s.is_empty());
    let pass = fw.password.as_deref().is_some_and(|s| !s.is_empty());
    if fw.enabled && user != pass {
        push_warn(
            issues,
            IssueCode::MissingRequired,
            format!(
                "/{index}/{}",
                if user { "secondaryForwardPassword" } else { "secondaryForwardUsername" }
            ),
            "forward credentials are incomplete and will be ignored".into(),
            Some("set both username and password, or neither"),
            Some(tag.as_ref()),
        );
    }
}

fn forward_key(field: &str) -> &'static str {
    match field {
        "protocol" => "secondaryForwardProtocol",
        "address" => "secondaryForwardAddress",
        "port" => "secondaryForwardPort",
        _ => "secondaryForwardEnable",
    }
}

fn print_human(report: &CheckReport) {
    for issue in &report.issues {
        let kind = match issue.kind {
            IssueKind::Error => "ERROR",
            IssueKind::Warning => "WARN",
        };
        match &issue.hint {
            Some(hint) => eprintln!(
                "[{kind}][{}] {}: {}  (hint: {hint})",
                issue.code, issue.ptr, issue.msg
            ),
            None => eprintln!("[{kind}][{}] {}: {}", issue.code, issue.ptr, issue.msg),
        }
    }
    let s = &report.summary;
    if report.ok {
        println!(
            "{} records ok ({} enabled, {} forwarding)",
            s.records, s.enabled, s.forwarding
        );
    } else {
        println!("{} errors, {} warnings", s.errors, s.warnings);
    }
}
