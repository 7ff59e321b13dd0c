use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;

use paramsync::app::sync_options;
use paramsync::config::Config;
use paramsync::prompt::Prompter;
use paramsync::reconcile::*;
use paramsync::store::{ParameterStore, StoreError};
use paramsync::Error;
use paramsync_core::env_file::parse;
use paramsync_core::models::*;
use speculate2::speculate;
use tokio_test::block_on;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get(String),
    Put {
        name: String,
        value: String,
        overwrite: bool,
    },
    Tag {
        name: String,
        tags: Vec<Tag>,
    },
}

/// In-memory store that records every call.
#[derive(Default)]
struct RecordingStore {
    values: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<Call>>,
    failing_reads: Vec<String>,
    failing_puts: Vec<String>,
    failing_tags: Vec<String>,
}

impl RecordingStore {
    fn with(values: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (name, value) in values {
            store
                .values
                .borrow_mut()
                .insert(name.to_string(), value.to_string());
        }
        store
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn puts(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Put { .. }))
            .collect()
    }

    fn tags(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Tag { .. }))
            .collect()
    }

    fn value(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }
}

impl ParameterStore for RecordingStore {
    async fn get(&self, path: &ParameterPath) -> Result<Option<String>, StoreError> {
        let name = path.to_string();
        self.calls.borrow_mut().push(Call::Get(name.clone()));
        if self.failing_reads.contains(&name) {
            return Err(StoreError::Read {
                name,
                message: "Rate exceeded".to_string(),
            });
        }
        Ok(self.values.borrow().get(&name).cloned())
    }

    async fn put(&self, request: &PutParameter) -> Result<(), StoreError> {
        let name = request.path.to_string();
        self.calls.borrow_mut().push(Call::Put {
            name: name.clone(),
            value: request.value.clone(),
            overwrite: request.overwrite,
        });
        if self.failing_puts.contains(&name) {
            return Err(StoreError::Write {
                name,
                message: "AccessDeniedException".to_string(),
            });
        }
        if !request.overwrite && self.values.borrow().contains_key(&name) {
            return Err(StoreError::Write {
                name,
                message: "ParameterAlreadyExists".to_string(),
            });
        }
        self.values.borrow_mut().insert(name, request.value.clone());
        Ok(())
    }

    async fn tag(&self, path: &ParameterPath, tags: &TagSet) -> Result<(), StoreError> {
        let name = path.to_string();
        self.calls.borrow_mut().push(Call::Tag {
            name: name.clone(),
            tags: tags.as_slice().to_vec(),
        });
        if self.failing_tags.contains(&name) {
            return Err(StoreError::Write {
                name,
                message: "TooManyTagsException".to_string(),
            });
        }
        Ok(())
    }
}

fn scripted(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
    Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

fn transcript(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(prompter.into_output()).expect("Output was not UTF-8")
}

fn base_tags() -> Vec<Tag> {
    vec![Tag::new("Project", "proj"), Tag::new("Environment", "dev")]
}

speculate! {
    before {
        let options = sync_options(&Config::default(), "proj", "dev");
    }

    describe "plan" {
        it "creates when there is no remote value" {
            assert_eq!(plan(None, "1"), Plan::Create);
        }

        it "skips when values match" {
            assert_eq!(plan(Some("1".to_string()), "1"), Plan::Unchanged);
        }

        it "asks when values differ" {
            assert_eq!(
                plan(Some("1".to_string()), "2"),
                Plan::Conflict { current: "1".to_string() }
            );
        }
    }

    describe "reconcile" {
        it "creates and tags every new key without prompting" {
            let store = RecordingStore::default();
            let mut prompter = scripted("");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=1\n#comment\n\nB=2")))
                .expect("reconcile failed");

            assert_eq!(store.calls(), vec![
                Call::Get("/proj/dev/A".to_string()),
                Call::Put { name: "/proj/dev/A".to_string(), value: "1".to_string(), overwrite: false },
                Call::Tag { name: "/proj/dev/A".to_string(), tags: base_tags() },
                Call::Get("/proj/dev/B".to_string()),
                Call::Put { name: "/proj/dev/B".to_string(), value: "2".to_string(), overwrite: false },
                Call::Tag { name: "/proj/dev/B".to_string(), tags: base_tags() },
            ]);
            assert_eq!(report.created(), 2);
            assert!(!transcript(prompter).contains("(yes/no)"));
        }

        it "never calls the store for blank, comment or separator-less lines" {
            let store = RecordingStore::default();
            let mut prompter = scripted("");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("NOEQUALS\n# A=1\n\n   \n")))
                .expect("reconcile failed");

            assert!(store.calls().is_empty());
            assert!(report.outcomes.is_empty());
        }

        it "skips a key whose remote value is identical" {
            let store = RecordingStore::with(&[("/proj/dev/A", "1")]);
            let mut prompter = scripted("");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=1")))
                .expect("reconcile failed");

            assert!(store.puts().is_empty());
            assert!(store.tags().is_empty());
            assert_eq!(report.outcome_of("A"), Some(&Outcome::Unchanged));
            assert!(transcript(prompter).contains("already exists with the same value. Skipping update."));
        }

        it "overwrites a differing value when the operator says yes" {
            let store = RecordingStore::with(&[("/proj/dev/A", "1")]);
            let mut prompter = scripted("yes\n");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=2")))
                .expect("reconcile failed");

            assert_eq!(store.puts(), vec![
                Call::Put { name: "/proj/dev/A".to_string(), value: "2".to_string(), overwrite: true },
            ]);
            assert_eq!(store.tags().len(), 1);
            assert_eq!(store.value("/proj/dev/A"), Some("2".to_string()));
            assert_eq!(report.outcome_of("A"), Some(&Outcome::Updated));

            let output = transcript(prompter);
            assert!(output.contains("Current Value: 1"));
            assert!(output.contains("New Value: 2"));
        }

        it "leaves a differing value alone when the operator says no" {
            let store = RecordingStore::with(&[("/proj/dev/A", "1")]);
            let mut prompter = scripted("no\n");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=2")))
                .expect("reconcile failed");

            assert!(store.puts().is_empty());
            assert!(store.tags().is_empty());
            assert_eq!(store.value("/proj/dev/A"), Some("1".to_string()));
            assert_eq!(report.declined(), 1);
        }

        it "re-asks on an invalid confirmation" {
            let store = RecordingStore::with(&[("/proj/dev/A", "1")]);
            let mut prompter = scripted("sure\n YES\n");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=2")))
                .expect("reconcile failed");

            assert_eq!(report.updated(), 1);
            assert!(transcript(prompter).contains("Please enter 'yes' or 'no'."));
        }

        it "skips a key whose read fails for a reason other than not-found" {
            let store = RecordingStore {
                failing_reads: vec!["/proj/dev/A".to_string()],
                ..Default::default()
            };
            let mut prompter = scripted("");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=1\nB=2")))
                .expect("reconcile failed");

            assert_eq!(store.puts(), vec![
                Call::Put { name: "/proj/dev/B".to_string(), value: "2".to_string(), overwrite: false },
            ]);
            assert!(matches!(report.outcome_of("A"), Some(Outcome::Failed(_))));
            assert_eq!(report.outcome_of("B"), Some(&Outcome::Created));
        }

        it "does not tag a key whose write failed and carries on" {
            let store = RecordingStore {
                failing_puts: vec!["/proj/dev/A".to_string()],
                ..Default::default()
            };
            let mut prompter = scripted("");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=1\nB=2")))
                .expect("reconcile failed");

            assert_eq!(store.tags(), vec![
                Call::Tag { name: "/proj/dev/B".to_string(), tags: base_tags() },
            ]);
            assert!(matches!(report.outcome_of("A"), Some(Outcome::Failed(_))));
            assert_eq!(report.failed(), 1);
            assert!(transcript(prompter).contains("Error creating/updating parameter /proj/dev/A"));
        }

        it "keeps the written value when tagging fails" {
            let store = RecordingStore {
                failing_tags: vec!["/proj/dev/A".to_string()],
                ..Default::default()
            };
            let mut prompter = scripted("");

            let report = block_on(reconcile(&store, &mut prompter, &options, &parse("A=1")))
                .expect("reconcile failed");

            assert_eq!(store.value("/proj/dev/A"), Some("1".to_string()));
            assert!(matches!(report.outcome_of("A"), Some(Outcome::Untagged(_))));
        }

        it "applies configured extra tags after the base tags" {
            let mut config = Config::default();
            config.tags.insert("Owner".to_string(), "platform".to_string());
            let options = sync_options(&config, "proj", "dev");
            let store = RecordingStore::default();
            let mut prompter = scripted("");

            block_on(reconcile(&store, &mut prompter, &options, &parse("A=1"))).expect("reconcile failed");

            assert_eq!(store.tags(), vec![Call::Tag {
                name: "/proj/dev/A".to_string(),
                tags: vec![
                    Tag::new("Project", "proj"),
                    Tag::new("Environment", "dev"),
                    Tag::new("Owner", "platform"),
                ],
            }]);
        }

        it "never lets extra tags replace Project or Environment" {
            let mut config = Config::default();
            config.tags.insert("Project".to_string(), "other".to_string());
            config.tags.insert("Environment".to_string(), "prod".to_string());
            config.tags.insert("Owner".to_string(), "platform".to_string());

            let options = sync_options(&config, "proj", "dev");

            assert_eq!(options.tags.get("Project"), Some("proj"));
            assert_eq!(options.tags.get("Environment"), Some("dev"));
            assert_eq!(options.tags.get("Owner"), Some("platform"));
            assert_eq!(options.tags.len(), 3);
        }

        it "stops when input closes mid-conversation" {
            let store = RecordingStore::with(&[("/proj/dev/A", "1")]);
            let mut prompter = scripted("");

            let result = block_on(reconcile(&store, &mut prompter, &options, &parse("A=2")));

            assert!(matches!(result, Err(Error::InputClosed)));
            assert!(store.puts().is_empty());
        }
    }

    describe "reconcile_file" {
        it "reports a missing file before touching the store" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let store = RecordingStore::default();
            let mut prompter = scripted("");

            let result = block_on(reconcile_file(&store, &mut prompter, &options, &dir.path().join(".env")));

            assert!(matches!(result, Err(Error::EnvFileMissing(_))));
            assert!(store.calls().is_empty());
        }

        it "syncs the entries of the file" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let env_path = dir.path().join(".env");
            fs::write(&env_path, "A=1\nA=3\nB=2\n").expect("write failed");
            let store = RecordingStore::default();
            let mut prompter = scripted("");

            let report = block_on(reconcile_file(&store, &mut prompter, &options, &env_path))
                .expect("reconcile failed");

            assert_eq!(report.created(), 2);
            assert_eq!(store.value("/proj/dev/A"), Some("3".to_string()));
            assert_eq!(report.to_string(), "2 created, 0 updated, 0 unchanged, 0 declined, 0 failed");
        }
    }

    describe "sync_options" {
        it "uses SecureString with the configured key and a templated description" {
            assert_eq!(
                options.parameter_type,
                ParameterType::SecureString { kms_key_id: Some("alias/aws/ssm".to_string()) }
            );
            assert_eq!(options.description.as_deref(), Some("Parameters for proj in dev"));
            assert_eq!(options.tags.as_slice(), base_tags().as_slice());
        }
    }
}
