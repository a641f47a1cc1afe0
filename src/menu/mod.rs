//! Interactive Menu Loop
//!
//! Fixed six-option menu translating free-text operator input into index
//! operations. The session owns the tree root and threads it through every
//! mutating call; I/O is injected so the loop can be driven from tests.

use chrono::{Duration, Local, NaiveDateTime};
use std::io::{BufRead, Write};
use std::time::Duration as StdDuration;
use tracing::{debug, info};

use crate::audit::AuditLog;
use crate::index::{self, Link};
use crate::store::ConnectionStore;
use crate::Result;

/// One interactive session over the connection index.
pub struct MenuSession<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    root: Link,
    store: ConnectionStore,
    audit: AuditLog,
    default_threshold: StdDuration,
}

impl<R: BufRead, W: Write> MenuSession<R, W> {
    pub fn new(
        reader: R,
        writer: W,
        root: Link,
        store: ConnectionStore,
        audit: AuditLog,
        default_threshold: StdDuration,
    ) -> Self {
        Self {
            reader,
            writer,
            root,
            store,
            audit,
            default_threshold,
        }
    }

    /// Run the menu until the operator quits (or input ends). The index is
    /// saved on the way out in both cases.
    pub fn run(mut self) -> Result<()> {
        loop {
            self.print_menu()?;
            let choice = match self.prompt("Enter your choice (1-6): ")? {
                Some(choice) => choice,
                // End of input counts as quit-and-save.
                None => {
                    writeln!(self.writer)?;
                    self.save_and_exit()?;
                    return Ok(());
                }
            };

            match choice.as_str() {
                "1" => self.add_connection()?,
                "2" => self.delete_connection()?,
                "3" => self.sweep_connections()?,
                "4" => self.search_connection()?,
                "5" => self.display_connections()?,
                "6" => {
                    self.save_and_exit()?;
                    return Ok(());
                }
                other => writeln!(
                    self.writer,
                    "Invalid choice `{other}`. Enter a number between 1 and 6."
                )?,
            }
        }
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "===== Connection Surveillance =====")?;
        writeln!(self.writer, "1. Add an IP connection")?;
        writeln!(self.writer, "2. Delete an IP")?;
        writeln!(self.writer, "3. Sweep inactive IPs")?;
        writeln!(self.writer, "4. Search for an IP")?;
        writeln!(self.writer, "5. Display all connections")?;
        writeln!(self.writer, "6. Save and quit")?;
        writeln!(self.writer, "===================================")?;
        Ok(())
    }

    /// Print `text` and read one trimmed line. `None` means input ended.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.writer, "{text}")?;
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_ip(&mut self, text: &str) -> Result<Option<String>> {
        match self.prompt(text)? {
            Some(ip) if !ip.is_empty() => Ok(Some(ip)),
            Some(_) => {
                writeln!(self.writer, "No IP address entered.")?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn add_connection(&mut self) -> Result<()> {
        let ip = match self.prompt_ip("IP address to add: ")? {
            Some(ip) => ip,
            None => return Ok(()),
        };

        let known = index::search(&self.root, &ip).is_some();
        self.root = index::insert(self.root.take(), &ip, Self::now());

        if known {
            writeln!(
                self.writer,
                "Connection {ip} already tracked, timestamp refreshed."
            )?;
        } else {
            writeln!(self.writer, "Connection {ip} added.")?;
        }
        debug!("Recorded connection from {ip}");
        self.audit.connection_added(&ip);
        Ok(())
    }

    fn delete_connection(&mut self) -> Result<()> {
        let ip = match self.prompt_ip("IP address to delete: ")? {
            Some(ip) => ip,
            None => return Ok(()),
        };

        if index::search(&self.root, &ip).is_none() {
            writeln!(self.writer, "No connection found for {ip}.")?;
            return Ok(());
        }

        self.root = index::delete(self.root.take(), &ip);
        writeln!(self.writer, "Connection {ip} deleted.")?;
        self.audit.connection_deleted(&ip);
        Ok(())
    }

    fn sweep_connections(&mut self) -> Result<()> {
        let prompt = format!(
            "Inactivity threshold in minutes [default: {}]: ",
            humantime::format_duration(self.default_threshold)
        );
        let input = match self.prompt(&prompt)? {
            Some(input) => input,
            None => return Ok(()),
        };

        // The threshold is vetted before the tree is touched at all. The cap
        // mirrors the config validation and keeps the seconds math in range.
        const MAX_MINUTES: u64 = 365 * 24 * 60;
        let threshold = if input.is_empty() {
            self.default_threshold
        } else {
            match input.parse::<u64>() {
                Ok(minutes) if minutes > 0 && minutes <= MAX_MINUTES => {
                    StdDuration::from_secs(minutes * 60)
                }
                _ => {
                    writeln!(
                        self.writer,
                        "Invalid threshold `{input}`: expected a positive number of minutes."
                    )?;
                    return Ok(());
                }
            }
        };

        let (root, evicted) = index::sweep_expired(
            self.root.take(),
            Self::now(),
            Duration::from_std(threshold).expect("validated threshold fits a time delta"),
        );
        self.root = root;

        if evicted.is_empty() {
            writeln!(
                self.writer,
                "No connections idle for more than {}.",
                humantime::format_duration(threshold)
            )?;
        } else {
            writeln!(self.writer, "Removed {} idle connections:", evicted.len())?;
            for ip in &evicted {
                writeln!(self.writer, "  - {ip}")?;
            }
        }
        info!("Sweep removed {} connections", evicted.len());
        self.audit.connections_swept(&evicted, threshold);
        Ok(())
    }

    fn search_connection(&mut self) -> Result<()> {
        let ip = match self.prompt_ip("IP address to search for: ")? {
            Some(ip) => ip,
            None => return Ok(()),
        };

        let found = match index::search(&self.root, &ip) {
            Some(entry) => {
                writeln!(self.writer, "{entry}")?;
                true
            }
            None => {
                writeln!(self.writer, "No connection found for {ip}.")?;
                false
            }
        };
        self.audit.connection_searched(&ip, found);
        Ok(())
    }

    fn display_connections(&mut self) -> Result<()> {
        let entries = index::inorder(&self.root);
        if entries.is_empty() {
            writeln!(self.writer, "No connections tracked.")?;
        } else {
            writeln!(self.writer, "{} tracked connections:", entries.len())?;
            for entry in &entries {
                writeln!(self.writer, "  {entry}")?;
            }
        }
        self.audit.connections_displayed(entries.len());
        Ok(())
    }

    fn save_and_exit(&mut self) -> Result<()> {
        let count = self.store.save(&self.root)?;
        writeln!(
            self.writer,
            "Saved {} connections to {}.",
            count,
            self.store.path().display()
        )?;
        info!("Saved {} connections to {}", count, self.store.path().display());
        self.audit.connections_saved(self.store.path(), count);
        self.audit.system_stopped();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn session(dir: &TempDir, script: &str) -> (Vec<u8>, std::path::PathBuf) {
        let data_file = dir.path().join("connections.txt");
        let audit_file = dir.path().join("audit.log");
        let store = ConnectionStore::new(&data_file);
        let audit = AuditLog::new(&audit_file, true);
        let mut output = Vec::new();

        MenuSession::new(
            Cursor::new(script.as_bytes().to_vec()),
            &mut output,
            None,
            store,
            audit,
            StdDuration::from_secs(300),
        )
        .run()
        .unwrap();

        (output, data_file)
    }

    fn stdout(output: &[u8]) -> String {
        String::from_utf8(output.to_vec()).unwrap()
    }

    #[test]
    fn add_display_and_quit_saves_in_order() {
        let dir = TempDir::new().unwrap();
        let script = "1\n10.0.0.2\n1\n10.0.0.1\n5\n6\n";
        let (output, data_file) = session(&dir, script);

        let out = stdout(&output);
        assert!(out.contains("Connection 10.0.0.2 added."));
        assert!(out.contains("Connection 10.0.0.1 added."));
        assert!(out.contains("2 tracked connections:"));
        assert!(out.contains("Saved 2 connections"));

        let saved = fs::read_to_string(&data_file).unwrap();
        let ips: Vec<&str> = saved
            .lines()
            .map(|line| line.split_once(',').unwrap().0)
            .collect();
        assert_eq!(ips, ["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn readding_an_ip_reports_a_refresh() {
        let dir = TempDir::new().unwrap();
        let script = "1\n10.0.0.1\n1\n10.0.0.1\n6\n";
        let (output, _) = session(&dir, script);
        let out = stdout(&output);
        assert!(out.contains("Connection 10.0.0.1 added."));
        assert!(out.contains("Connection 10.0.0.1 already tracked, timestamp refreshed."));
        assert!(out.contains("Saved 1 connections"));
    }

    #[test]
    fn delete_and_search_report_missing_keys() {
        let dir = TempDir::new().unwrap();
        let script = "1\n10.0.0.1\n2\n10.0.0.9\n4\n10.0.0.9\n2\n10.0.0.1\n4\n10.0.0.1\n6\n";
        let (output, _) = session(&dir, script);
        let out = stdout(&output);
        assert!(out.contains("No connection found for 10.0.0.9."));
        assert!(out.contains("Connection 10.0.0.1 deleted."));
        assert!(out.contains("Saved 0 connections"));
    }

    #[test]
    fn invalid_threshold_leaves_the_index_untouched() {
        let dir = TempDir::new().unwrap();
        let script = "1\n10.0.0.1\n3\n0\n3\nsoon\n6\n";
        let (output, _) = session(&dir, script);
        let out = stdout(&output);
        assert!(out.contains("Invalid threshold `0`"));
        assert!(out.contains("Invalid threshold `soon`"));
        assert!(out.contains("Saved 1 connections"));
    }

    #[test]
    fn sweep_with_default_threshold_keeps_fresh_entries() {
        let dir = TempDir::new().unwrap();
        let script = "1\n10.0.0.1\n3\n\n6\n";
        let (output, _) = session(&dir, script);
        let out = stdout(&output);
        assert!(out.contains("No connections idle for more than 5m."));
        assert!(out.contains("Saved 1 connections"));
    }

    #[test]
    fn unknown_choice_reprompts() {
        let dir = TempDir::new().unwrap();
        let script = "9\n6\n";
        let (output, _) = session(&dir, script);
        assert!(stdout(&output).contains("Invalid choice `9`."));
    }

    #[test]
    fn end_of_input_saves_and_exits() {
        let dir = TempDir::new().unwrap();
        let script = "1\n10.0.0.1\n";
        let (output, data_file) = session(&dir, script);
        assert!(stdout(&output).contains("Saved 1 connections"));
        assert!(data_file.exists());
    }
}
