use duesly_client::commands::{contributions, dash, insights, members, reminders, tickets};
use duesly_client::{ClientResult, SuccessEnvelope};

use crate::cli::{
    Cli, Commands, ContributionCommand, InsightsCommand, MemberCommand, ReminderCommand,
    TicketCommand,
};
use crate::daemon;

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    let home = cli.home.as_deref();
    match &cli.command {
        Commands::Member { command } => dispatch_member(command, home),
        Commands::Contribution { command } => dispatch_contribution(command, home),
        Commands::Ticket { command } => dispatch_ticket(command, home),
        Commands::Insights { command } => match command {
            InsightsCommand::Predictions => insights::predictions(insights::PredictionsOptions {
                home_override: home,
                ..Default::default()
            }),
            InsightsCommand::Member { member_id } => {
                insights::member(insights::MemberInsightsOptions {
                    member_id: member_id.clone(),
                    home_override: home,
                    ..Default::default()
                })
            }
        },
        Commands::Dash => dash::run(dash::DashOptions {
            home_override: home,
            ..Default::default()
        }),
        Commands::Reminder { command } => dispatch_reminder(command, home),
        Commands::Scheduler { .. } => daemon::serve(home),
    }
}

fn dispatch_member(
    command: &MemberCommand,
    home: Option<&std::path::Path>,
) -> ClientResult<SuccessEnvelope> {
    match command {
        MemberCommand::Register {
            name,
            phone,
            email,
            amount,
            due_day,
        } => members::register(members::MemberRegisterOptions {
            name: name.clone(),
            phone: phone.clone(),
            email: email.clone(),
            monthly_amount: *amount,
            due_day: *due_day,
            home_override: home,
            ..Default::default()
        }),
        MemberCommand::Signup {
            name,
            phone,
            email,
            password,
        } => members::signup(members::MemberSignupOptions {
            name: name.clone(),
            phone: phone.clone(),
            email: email.clone(),
            password: password.clone(),
            home_override: home,
            ..Default::default()
        }),
        MemberCommand::List { include_admins } => members::list(members::MemberListOptions {
            include_admins: *include_admins,
            home_override: home,
            ..Default::default()
        }),
        MemberCommand::Search { employee_id } => members::search(members::MemberSearchOptions {
            employee_id: employee_id.clone(),
            home_override: home,
            ..Default::default()
        }),
        MemberCommand::Settings {
            member_id,
            amount,
            due_day,
        } => members::payment_settings(members::PaymentSettingsOptions {
            member_id: member_id.clone(),
            monthly_amount: *amount,
            due_day: *due_day,
            home_override: home,
        }),
        MemberCommand::Preferences {
            member_id,
            email,
            sms,
            whatsapp,
            reminder_days,
        } => members::preferences(members::PreferencesOptions {
            member_id: member_id.clone(),
            email: *email,
            sms: *sms,
            whatsapp: *whatsapp,
            reminder_days_before: *reminder_days,
            home_override: home,
        }),
        MemberCommand::Password {
            member_id,
            current,
            new,
        } => members::change_password(members::PasswordChangeOptions {
            member_id: member_id.clone(),
            current_password: current.clone(),
            new_password: new.clone(),
            home_override: home,
        }),
        MemberCommand::Login { email, password } => members::login(members::LoginOptions {
            email: email.clone(),
            password: password.clone(),
            home_override: home,
        }),
        MemberCommand::Dashboard { member_id } => members::dashboard(member_view(member_id, None, home)),
        MemberCommand::History { member_id } => members::history(member_view(member_id, None, home)),
        MemberCommand::Notifications { member_id, limit } => {
            members::notifications(member_view(member_id, *limit, home))
        }
    }
}

fn member_view<'a>(
    member_id: &str,
    limit: Option<usize>,
    home: Option<&'a std::path::Path>,
) -> members::MemberViewOptions<'a> {
    members::MemberViewOptions {
        member_id: member_id.to_string(),
        limit,
        home_override: home,
        now_override: None,
    }
}

fn dispatch_contribution(
    command: &ContributionCommand,
    home: Option<&std::path::Path>,
) -> ClientResult<SuccessEnvelope> {
    let view = || contributions::ContributionViewOptions {
        home_override: home,
        now_override: None,
    };
    match command {
        ContributionCommand::Generate => contributions::generate(contributions::GenerateOptions {
            home_override: home,
            ..Default::default()
        }),
        ContributionCommand::Pay {
            contribution_id,
            paid_date,
        } => contributions::pay(contributions::PaymentOptions {
            contribution_id: contribution_id.clone(),
            paid_date: paid_date.as_ref().map(|date| date.as_str().to_string()),
            home_override: home,
            ..Default::default()
        }),
        ContributionCommand::PayAll { member_id } => {
            contributions::pay_all(contributions::PayAllOptions {
                member_id: member_id.clone(),
                home_override: home,
                ..Default::default()
            })
        }
        ContributionCommand::Status => contributions::status(view()),
        ContributionCommand::Failed => contributions::failed(view()),
        ContributionCommand::Import { dry_run, path } => {
            contributions::import_history(contributions::ContributionImportOptions {
                path: path.clone(),
                dry_run: *dry_run,
                home_override: home,
                ..Default::default()
            })
        }
    }
}

fn dispatch_ticket(
    command: &TicketCommand,
    home: Option<&std::path::Path>,
) -> ClientResult<SuccessEnvelope> {
    match command {
        TicketCommand::Create {
            member_id,
            request_type,
            value,
            reason,
        } => tickets::create(tickets::TicketCreateOptions {
            member_id: member_id.clone(),
            request_type: request_type.clone(),
            new_value: *value,
            reason: reason.clone(),
            home_override: home,
            ..Default::default()
        }),
        TicketCommand::List { member, status } => tickets::list(tickets::TicketListOptions {
            member_id: member.clone(),
            status: status.clone(),
            home_override: home,
        }),
        TicketCommand::Resolve {
            ticket_id,
            status,
            response,
        } => tickets::resolve(tickets::TicketResolveOptions {
            ticket_id: ticket_id.clone(),
            status: status.clone(),
            admin_response: response.clone(),
            home_override: home,
            ..Default::default()
        }),
    }
}

fn dispatch_reminder(
    command: &ReminderCommand,
    home: Option<&std::path::Path>,
) -> ClientResult<SuccessEnvelope> {
    match command {
        ReminderCommand::Run => reminders::run(reminders::ReminderRunOptions {
            home_override: home,
            ..Default::default()
        }),
        ReminderCommand::Send { member_id, message } => {
            reminders::send(reminders::ReminderSendOptions {
                member_id: member_id.clone(),
                message: message.clone(),
                home_override: home,
                ..Default::default()
            })
        }
        ReminderCommand::History { limit } => reminders::history(reminders::ReminderHistoryOptions {
            limit: *limit,
            home_override: home,
        }),
        ReminderCommand::Schedule => reminders::schedule(reminders::ReminderScheduleOptions {
            home_override: home,
            ..Default::default()
        }),
    }
}
