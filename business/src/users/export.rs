//! CSV export of the visible rows.

use chrono::NaiveDate;

use super::model::User;

pub const CSV_HEADER: [&str; 10] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Role",
    "Status",
    "Join Date",
    "Last Login",
    "Orders",
    "Email Verified",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Bare unless the value would break the row.
fn escaped(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quoted(field)
    } else {
        field.to_owned()
    }
}

fn row(user: &User) -> String {
    let joined = user
        .created_at
        .map(|at| at.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    let last_login = user
        .last_login
        .map_or_else(|| "Never".to_owned(), |at| at.format(DATE_FORMAT).to_string());

    [
        escaped(user.id.as_str()),
        quoted(&user.name),
        quoted(&user.email),
        escaped(user.mobile.as_deref().unwrap_or_default()),
        user.role.map(|role| role.as_str()).unwrap_or_default().to_owned(),
        user.status.map(|status| status.as_str()).unwrap_or_default().to_owned(),
        joined,
        last_login,
        user.order_count().to_string(),
        if user.email_verified { "Yes" } else { "No" }.to_owned(),
    ]
    .join(",")
}

/// Header plus one line per user, `\n`-separated, no trailing newline.
pub fn users_to_csv(users: &[User]) -> String {
    std::iter::once(CSV_HEADER.join(","))
        .chain(users.iter().map(row))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("users_export_{}.csv", date.format(DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{UserRole, UserStatus};
    use chrono::{TimeZone, Utc};

    #[test]
    fn two_users_make_three_lines() {
        let users = vec![
            User::new("u1", "Ann \"A\" Lee", "ann@x.io")
                .with_mobile("5551234")
                .with_role(UserRole::User)
                .with_status(UserStatus::Active)
                .with_created_at(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
                .with_last_login(Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap())
                .with_orders(2)
                .with_email_verified(true),
            User::new("u2", "Bob, Jr", "bob@x.io").with_role(UserRole::Admin),
        ];

        let csv = users_to_csv(&users);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(!csv.ends_with('\n'));
        assert_eq!(
            lines[0],
            "ID,Name,Email,Phone,Role,Status,Join Date,Last Login,Orders,Email Verified"
        );
        assert_eq!(
            lines[1],
            r#"u1,"Ann ""A"" Lee","ann@x.io",5551234,user,Active,2024-03-01,2024-05-02,2,Yes"#
        );
        assert_eq!(lines[2], r#"u2,"Bob, Jr","bob@x.io",,admin,,,Never,0,No"#);
    }

    #[test]
    fn phone_and_id_with_separators_keep_ten_columns() {
        let users = vec![
            User::new("u1", "Ann", "a@x").with_mobile("555-0100, ext 2"),
            User::new("legacy,7", "Bob", "b@x").with_mobile("say \"hi\""),
        ];

        let csv = users_to_csv(&users);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[1], r#"u1,"Ann","a@x","555-0100, ext 2",,,,Never,0,No"#);
        assert_eq!(
            lines[2],
            r#""legacy,7","Bob","b@x","say ""hi""",,,,Never,0,No"#
        );
    }

    #[test]
    fn empty_view_is_header_only() {
        assert_eq!(users_to_csv(&[]), CSV_HEADER.join(","));
    }

    #[test]
    fn file_name_uses_export_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        assert_eq!(export_file_name(date), "users_export_2024-07-09.csv");
    }
}
