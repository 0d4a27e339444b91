//! HTML bodies for reminder emails. All interpolated text is escaped.

use crate::intelligence::messages::format_amount;
use crate::intelligence::types::Classification;

#[derive(Debug, Clone, PartialEq)]
pub struct MemberStats {
    pub total_contributions: usize,
    pub paid_count: usize,
    pub missed_count: usize,
    pub classification: Classification,
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn paragraphs(message: &str) -> String {
    escape_html(message).replace('\n', "<br>\n")
}

pub fn reminder_html(member_name: &str, message: &str, amount: f64, due_date: &str) -> String {
    let name = escape_html(member_name);
    let body = paragraphs(message);
    let due = escape_html(due_date);
    let amount = format_amount(amount);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<style>
  body {{ font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 20px; }}
  .container {{ max-width: 600px; margin: 0 auto; background: white; border-radius: 10px; overflow: hidden; }}
  .header {{ background: linear-gradient(135deg, #6366f1, #4f46e5); color: white; padding: 30px; text-align: center; }}
  .content {{ padding: 30px; line-height: 1.6; color: #333; }}
  .amount {{ font-size: 24px; font-weight: bold; color: #6366f1; }}
  .due-date {{ background: #f0f9ff; padding: 15px; border-radius: 5px; border-left: 4px solid #6366f1; margin: 20px 0; }}
  .footer {{ background: #f9fafb; padding: 20px; text-align: center; font-size: 12px; color: #6b7280; }}
</style>
</head>
<body>
  <div class="container">
    <div class="header"><h1>💰 Contribution Reminder</h1></div>
    <div class="content">
      <h2>Hello {name},</h2>
      <p>{body}</p>
      <div class="due-date">
        <strong>📅 Due Date:</strong> {due}<br>
        <strong>💳 Amount:</strong> <span class="amount">₹{amount}</span>
      </div>
      <p>Thank you for being a valued member of our community!</p>
    </div>
    <div class="footer">
      <p>This is an automated reminder from Contribution Tracking System</p>
      <p>We're here to support you. If you have any questions, please reach out.</p>
    </div>
  </div>
</body>
</html>
"#
    )
}

pub fn reminder_with_stats_html(
    member_name: &str,
    message: &str,
    amount: f64,
    due_date: &str,
    stats: &MemberStats,
) -> String {
    let name = escape_html(member_name);
    let body = paragraphs(message);
    let due = escape_html(due_date);
    let amount = format_amount(amount);
    let total = stats.total_contributions;
    let paid = stats.paid_count;
    let missed = stats.missed_count;
    let (paid_percent, missed_percent) = if total > 0 {
        (
            paid as f64 / total as f64 * 100.0,
            missed as f64 / total as f64 * 100.0,
        )
    } else {
        (0.0, 0.0)
    };
    let label = stats.classification.as_str();
    let badge_color = classification_color(stats.classification);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<style>
  body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #f4f7fa; margin: 0; padding: 20px 10px; }}
  .container {{ max-width: 650px; margin: 0 auto; background: white; border-radius: 12px; overflow: hidden; }}
  .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 35px 30px; text-align: center; }}
  .content {{ padding: 35px 30px; line-height: 1.7; color: #374151; }}
  .message-box {{ background: #f9fafb; padding: 20px; border-radius: 8px; border-left: 4px solid #667eea; margin: 25px 0; }}
  .stat-card {{ display: inline-block; width: 30%; padding: 20px 0; text-align: center; border: 1px solid #e2e8f0; border-radius: 10px; }}
  .stat-number {{ font-size: 32px; font-weight: bold; display: block; }}
  .stat-label {{ font-size: 12px; color: #64748b; text-transform: uppercase; }}
  .chart-bar {{ height: 28px; background: #e5e7eb; border-radius: 14px; overflow: hidden; margin: 12px 0; }}
  .chart-bar-fill {{ height: 100%; color: white; font-size: 12px; padding-left: 12px; }}
  .paid {{ background: #10b981; }}
  .missed {{ background: #ef4444; }}
  .classification-badge {{ display: inline-block; padding: 8px 16px; border-radius: 20px; background-color: {badge_color}; color: white; font-weight: 600; text-transform: uppercase; }}
  .due-date-box {{ background: #fef3c7; padding: 25px; border-radius: 12px; margin: 25px 0; border-left: 5px solid #f59e0b; }}
  .amount {{ font-size: 36px; font-weight: bold; color: #b45309; }}
  .footer {{ background: #f9fafb; padding: 25px 30px; text-align: center; font-size: 13px; color: #6b7280; }}
</style>
</head>
<body>
  <div class="container">
    <div class="header"><h1>💰 Payment Reminder</h1></div>
    <div class="content">
      <div class="greeting">Hello {name}! 👋</div>
      <div class="message-box">{body}</div>
      <div>
        <div class="stat-card"><span class="stat-number">{total}</span><span class="stat-label">Total</span></div>
        <div class="stat-card"><span class="stat-number" style="color: #10b981;">{paid}</span><span class="stat-label">Paid</span></div>
        <div class="stat-card"><span class="stat-number" style="color: #ef4444;">{missed}</span><span class="stat-label">Pending</span></div>
      </div>
      <h3>📊 Your Payment Summary</h3>
      <div class="chart-bar"><div class="chart-bar-fill paid" style="width: {paid_percent:.0}%;">{paid}/{total}</div></div>
      <div class="chart-bar"><div class="chart-bar-fill missed" style="width: {missed_percent:.0}%;">{missed}</div></div>
      <div style="text-align: center;"><span class="classification-badge">{label}</span></div>
      <div class="due-date-box">
        <strong>📅 UPCOMING PAYMENT</strong>
        <div class="amount">₹{amount}</div>
        <div class="due-date">Due: {due}</div>
      </div>
      <p style="text-align: center;">Thank you for being a valued member of our community! Your contributions make a real difference. 🙏</p>
    </div>
    <div class="footer">
      <p><strong>Contribution Tracking System</strong></p>
      <p>This is an automated reminder based on your payment schedule.</p>
      <p>If you have any questions, please don't hesitate to reach out.</p>
    </div>
  </div>
</body>
</html>
"#
    )
}

fn classification_color(classification: Classification) -> &'static str {
    match classification {
        Classification::Regular => "#10b981",
        Classification::OccasionalDelay => "#f59e0b",
        Classification::HighRiskDelay => "#ef4444",
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberStats, escape_html, reminder_html, reminder_with_stats_html};
    use crate::intelligence::types::Classification;

    #[test]
    fn member_supplied_text_is_escaped() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
        let html = reminder_html("<script>", "hello", 500.0, "2026-03-10");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("₹500"));
    }

    #[test]
    fn stats_body_shows_counts_and_badge() {
        let stats = MemberStats {
            total_contributions: 4,
            paid_count: 3,
            missed_count: 1,
            classification: Classification::OccasionalDelay,
        };
        let html = reminder_with_stats_html("Asha", "line\nnext", 750.0, "2026-03-10", &stats);
        assert!(html.contains("3/4"));
        assert!(html.contains("width: 75%"));
        assert!(html.contains("Occasional Delay"));
        assert!(html.contains("#f59e0b"));
        assert!(html.contains("line<br>\nnext"));
    }
}
