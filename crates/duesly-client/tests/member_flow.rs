mod support;

use duesly_client::commands::members::{
    self, LoginOptions, MemberListOptions, MemberRegisterOptions, MemberSearchOptions,
    MemberSignupOptions, MemberViewOptions, PasswordChangeOptions, PaymentSettingsOptions,
    PreferencesOptions,
};
use duesly_client::commands::tickets::{
    self, TicketCreateOptions, TicketListOptions, TicketResolveOptions,
};
use support::duesly_testkit::{
    at, high_risk_history, import_history, payload, register_member, temp_home,
};

#[test]
fn registration_issues_ids_and_the_default_password() {
    let temp = temp_home("duesly-register");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let data = payload(members::register(MemberRegisterOptions {
            name: "Asha Rao".to_string(),
            phone: "98765 43210".to_string(),
            email: Some("asha@example.com".to_string()),
            home_override: Some(&home),
            now_override: Some(at(2026, 3, 14, 10)),
            rng_seed: Some(11),
            ..Default::default()
        }));

        assert_eq!(data["member"]["member_id"], "M001");
        assert_eq!(data["default_password"], "pass123");
        assert_eq!(data["member"]["monthly_amount"], 500.0);
        assert_eq!(data["member"]["due_day"], 5);
        assert_eq!(data["member"]["must_change_password"], true);
        let employee_id = data["member"]["employee_id"].as_str().unwrap_or_default();
        assert!(employee_id.starts_with("EMP-20260314-"));

        let second = register_member(&home, "Ravi Kumar", "9123456780", None);
        assert_eq!(second, "M002");
    }
}

#[test]
fn invalid_phone_and_duplicate_email_are_rejected() {
    let temp = temp_home("duesly-register-invalid");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let bad_phone = members::register(MemberRegisterOptions {
            name: "Asha".to_string(),
            phone: "12345".to_string(),
            home_override: Some(&home),
            ..Default::default()
        });
        assert!(matches!(bad_phone, Err(ref error) if error.code == "invalid_argument"));

        register_member(&home, "Asha", "9876543210", Some("asha@example.com"));
        let duplicate = members::signup(MemberSignupOptions {
            name: "Other Asha".to_string(),
            phone: "9876543211".to_string(),
            email: "asha@example.com".to_string(),
            password: "secret99".to_string(),
            home_override: Some(&home),
            ..Default::default()
        });
        assert!(matches!(duplicate, Err(ref error) if error.code == "member_conflict"));
    }
}

#[test]
fn signup_login_and_password_change_round_trip() {
    let temp = temp_home("duesly-signup");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let data = payload(members::signup(MemberSignupOptions {
            name: "Meera".to_string(),
            phone: "9000000001".to_string(),
            email: "meera@example.com".to_string(),
            password: "first-pass".to_string(),
            home_override: Some(&home),
            now_override: Some(at(2026, 3, 1, 8)),
            rng_seed: Some(3),
        }));
        let member_id = data["member"]["member_id"].as_str().unwrap_or_default().to_string();
        assert_eq!(data["member"]["must_change_password"], false);

        let wrong = members::login(LoginOptions {
            email: "meera@example.com".to_string(),
            password: "nope".to_string(),
            home_override: Some(&home),
        });
        assert!(matches!(wrong, Err(ref error) if error.code == "invalid_credentials"));

        let short = members::change_password(PasswordChangeOptions {
            member_id: member_id.clone(),
            current_password: "first-pass".to_string(),
            new_password: "abc".to_string(),
            home_override: Some(&home),
        });
        assert!(matches!(short, Err(ref error) if error.code == "invalid_argument"));

        payload(members::change_password(PasswordChangeOptions {
            member_id: member_id.clone(),
            current_password: "first-pass".to_string(),
            new_password: "second-pass".to_string(),
            home_override: Some(&home),
        }));
        let login = payload(members::login(LoginOptions {
            email: "meera@example.com".to_string(),
            password: "second-pass".to_string(),
            home_override: Some(&home),
        }));
        assert_eq!(login["member_id"], member_id.as_str());
        assert_eq!(login["role"], "member");
    }
}

#[test]
fn approving_an_amount_ticket_updates_the_member() {
    let temp = temp_home("duesly-ticket");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let member_id = register_member(&home, "Asha", "9876543210", Some("asha@example.com"));

        let bad_value = tickets::create(TicketCreateOptions {
            member_id: member_id.clone(),
            request_type: "due_day".to_string(),
            new_value: 40.0,
            reason: "Salary date".to_string(),
            home_override: Some(&home),
            ..Default::default()
        });
        assert!(matches!(bad_value, Err(ref error) if error.code == "invalid_argument"));

        let created = payload(tickets::create(TicketCreateOptions {
            member_id: member_id.clone(),
            request_type: "monthly_amount".to_string(),
            new_value: 750.0,
            reason: "Can contribute more".to_string(),
            home_override: Some(&home),
            now_override: Some(at(2026, 4, 1, 9)),
        }));
        let ticket_id = created["ticket"]["ticket_id"].as_str().unwrap_or_default().to_string();
        assert_eq!(created["ticket"]["status"], "pending");
        assert_eq!(created["ticket"]["current_value"], 500.0);

        let pending = payload(tickets::list(TicketListOptions {
            status: Some("pending".to_string()),
            home_override: Some(&home),
            ..Default::default()
        }));
        assert_eq!(pending["rows"].as_array().map(Vec::len), Some(1));

        let resolved = payload(tickets::resolve(TicketResolveOptions {
            ticket_id: ticket_id.clone(),
            status: "approved".to_string(),
            admin_response: Some("Approved".to_string()),
            home_override: Some(&home),
            now_override: Some(at(2026, 4, 2, 9)),
        }));
        assert_eq!(resolved["ticket"]["status"], "approved");
        assert_eq!(resolved["message"], "Ticket approved");

        let dashboard = payload(members::dashboard(MemberViewOptions {
            member_id: member_id.clone(),
            home_override: Some(&home),
            ..Default::default()
        }));
        assert_eq!(dashboard["member_info"]["monthly_amount"], 750.0);

        let again = tickets::resolve(TicketResolveOptions {
            ticket_id,
            status: "rejected".to_string(),
            home_override: Some(&home),
            ..Default::default()
        });
        assert!(matches!(again, Err(ref error) if error.code == "ticket_already_resolved"));
    }
}

#[test]
fn admin_listing_classifies_members() {
    let temp = temp_home("duesly-member-list");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let risky = register_member(&home, "Asha", "9876543210", Some("asha@example.com"));
        let steady = register_member(&home, "Ravi", "9123456780", None);
        import_history(&home, &high_risk_history(&risky));

        let data = payload(members::list(MemberListOptions {
            home_override: Some(&home),
            now_override: Some(at(2026, 6, 3, 9)),
            ..Default::default()
        }));
        assert_eq!(data["total"], 2);
        let rows = data["members"].as_array().cloned().unwrap_or_default();
        let risky_row = rows.iter().find(|row| row["member_id"] == risky.as_str());
        let steady_row = rows.iter().find(|row| row["member_id"] == steady.as_str());
        assert!(risky_row.is_some() && steady_row.is_some());
        if let (Some(risky_row), Some(steady_row)) = (risky_row, steady_row) {
            assert_eq!(risky_row["classification"], "High-risk Delay");
            assert_eq!(risky_row["priority"], "Early Reminder");
            assert_eq!(risky_row["missed_count"], 4);
            assert_eq!(risky_row["avg_delay_days"], 45.0);
            assert_eq!(steady_row["classification"], "Regular");
            assert_eq!(steady_row["total_contributions"], 0);
        }

        let employee_id = rows
            .iter()
            .find(|row| row["member_id"] == risky.as_str())
            .and_then(|row| row["employee_id"].as_str())
            .unwrap_or_default()
            .to_string();
        let found = payload(members::search(MemberSearchOptions {
            employee_id,
            home_override: Some(&home),
            now_override: Some(at(2026, 6, 3, 9)),
        }));
        assert_eq!(found["member_id"], risky.as_str());

        let missing = members::search(MemberSearchOptions {
            employee_id: "EMP-00000000-0000".to_string(),
            home_override: Some(&home),
            ..Default::default()
        });
        assert!(matches!(missing, Err(ref error) if error.code == "member_not_found"));
    }
}

#[test]
fn settings_and_preferences_are_partial_updates() {
    let temp = temp_home("duesly-preferences");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let member_id = register_member(&home, "Asha", "9876543210", Some("asha@example.com"));

        let settings = payload(members::payment_settings(PaymentSettingsOptions {
            member_id: member_id.clone(),
            due_day: Some(20),
            home_override: Some(&home),
            ..Default::default()
        }));
        assert_eq!(settings["due_day"], 20);
        assert_eq!(settings["monthly_amount"], 500.0);

        let prefs = payload(members::preferences(PreferencesOptions {
            member_id: member_id.clone(),
            sms: Some(true),
            home_override: Some(&home),
            ..Default::default()
        }));
        assert_eq!(prefs["preferences"]["sms"], true);
        assert_eq!(prefs["preferences"]["email"], true);

        let empty = members::payment_settings(PaymentSettingsOptions {
            member_id,
            home_override: Some(&home),
            ..Default::default()
        });
        assert!(matches!(empty, Err(ref error) if error.code == "invalid_argument"));
    }
}
