use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::{
    actions::{action_model::ActionDescriptor, normalize::normalize_actions},
    control::{control_model::ControlTree, correlator::ExternalErrorMap},
    data::{flatten::flatten, initial_data::push_initial_data},
    form::{
        error::FormError,
        form_model::{FormConfig, SubmitEvent},
    },
    layout::compiler::compile_layout,
    trace::{
        logger::TraceLogger,
        trace::{FormEventKind, TraceEvent},
    },
    transport::transport::{FormTransport, SubmitMethod, SubmitOutcome},
};

pub type InitialDataTransform = Box<dyn Fn(Value) -> Value>;

/// One form instance: its config, compiled tree, actions and the
/// transport it talks through.
///
/// Without a transport, submissions are reported back as
/// `SubmitEvent::Submitted` with no response.
pub struct FormSession {
    transport: Option<Box<dyn FormTransport>>,
    config: Option<FormConfig>,
    form_title: Option<String>,
    actions: Vec<ActionDescriptor>,
    tree: Option<ControlTree>,
    initial_data: Option<Map<String, Value>>,
    initial_data_transformation: Option<InitialDataTransform>,
    tracer: TraceLogger,
}

impl FormSession {
    pub fn offline() -> Self {
        Self {
            transport: None,
            config: None,
            form_title: None,
            actions: Vec::new(),
            tree: None,
            initial_data: None,
            initial_data_transformation: None,
            tracer: TraceLogger::disabled(),
        }
    }

    pub fn with_transport(transport: impl FormTransport + 'static) -> Self {
        Self {
            transport: Some(Box::new(transport)),
            ..Self::offline()
        }
    }

    /// A title given here is kept over the one the config carries.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.form_title = Some(title.into());
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    /// Applied to fetched initial data before it reaches the fields.
    pub fn with_initial_data_transformation(mut self, transform: impl Fn(Value) -> Value + 'static) -> Self {
        self.initial_data_transformation = Some(Box::new(transform));
        self
    }

    /// Fetch the config unless one was set already, load initial data when
    /// the config asks for it, then mark every field touched.
    pub fn init(&mut self) -> Result<(), FormError> {
        if self.config.is_none() {
            let transport = self.transport.as_ref().ok_or(FormError::NoTransport("form"))?;
            let config = transport.fetch_form()?;
            self.set_config(config)?;
        }

        if self.config.as_ref().is_some_and(|c| c.has_initial_data) {
            self.load_initial_data()?;
        }

        // Errors present at setup show without waiting for user input.
        if let Some(tree) = &mut self.tree {
            tree.touch_all();
        }
        Ok(())
    }

    /// Install a new config: title, actions and a freshly compiled tree.
    /// On error the session keeps its previous state.
    pub fn set_config(&mut self, config: FormConfig) -> Result<(), FormError> {
        let actions = normalize_actions(config.actions.as_ref())?;
        let tree = compile_layout(&config.layout)?;

        if self.form_title.is_none() {
            self.form_title = config.form_title.clone();
        }
        self.actions = actions;
        self.config = Some(config);
        self.install_tree(tree);
        Ok(())
    }

    /// Replace only the layout and recompile.
    pub fn set_layout(&mut self, layout: Vec<Value>) -> Result<(), FormError> {
        let tree = compile_layout(&layout)?;
        self.config.get_or_insert_with(FormConfig::default).layout = layout;
        self.install_tree(tree);
        Ok(())
    }

    fn install_tree(&mut self, mut tree: ControlTree) {
        if let Some(data) = &self.initial_data {
            push_initial_data(&mut tree, data);
        }

        self.tracer.log(
            &TraceEvent::now(FormEventKind::Compiled)
                .with_fingerprint(tree.fingerprint())
                .with_fields(tree.leaf_ids()),
        );
        info!(
            "form '{}' compiled with {} fields",
            self.form_title.as_deref().unwrap_or_default(),
            tree.leaf_ids().len()
        );
        self.tree = Some(tree);
    }

    pub fn load_initial_data(&mut self) -> Result<usize, FormError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(FormError::NoTransport("initial data"))?;
        let mut data = transport.fetch_initial_data()?;

        if let Some(transform) = &self.initial_data_transformation {
            data = transform(data);
        }
        Ok(self.set_initial_data(data))
    }

    /// Remember the record and push it into the current tree; it is pushed
    /// again into every later recompilation. Non-object data is ignored.
    pub fn set_initial_data(&mut self, data: Value) -> usize {
        let record = match data {
            Value::Object(record) => record,
            other => {
                warn!("ignoring initial data that is not an object: {}", other);
                return 0;
            }
        };

        let applied = match &mut self.tree {
            Some(tree) => push_initial_data(tree, &record),
            None => 0,
        };

        self.tracer.log(
            &TraceEvent::now(FormEventKind::InitialData)
                .with_fingerprint(self.tree.as_ref().and_then(ControlTree::fingerprint))
                .with_fields(record.keys().cloned()),
        );
        self.initial_data = Some(record);
        applied
    }

    /// Deliver server errors to the tree, or clear pending ones with `None`.
    pub fn set_errors(&mut self, errors: Option<&ExternalErrorMap>) -> Vec<String> {
        let Some(tree) = &mut self.tree else {
            debug!("errors delivered before the layout was compiled, dropped");
            return Vec::new();
        };

        let surfaced = tree.deliver_errors(errors);
        let event = match errors {
            Some(errors) if !errors.is_empty() => {
                TraceEvent::now(FormEventKind::ErrorsDelivered).with_fields(errors.keys().cloned())
            }
            _ => TraceEvent::now(FormEventKind::ErrorsCleared),
        };
        self.tracer.log(&event.with_fingerprint(tree.fingerprint()));
        surfaced
    }

    /// Flatten the current value and either report a cancel or submit it.
    ///
    /// The pressed button's id is added to the record as `true`.
    pub fn submitted(&mut self, button_id: Option<&str>, is_cancel: bool) -> Result<SubmitEvent, FormError> {
        let tree = self.tree.as_ref().ok_or(FormError::NotCompiled)?;
        let fingerprint = tree.fingerprint().map(str::to_string);

        let mut data = flatten(tree, &tree.value())?;
        if let Some(id) = button_id {
            data.insert(id.to_string(), Value::Bool(true));
        }

        let trace = |kind: FormEventKind| {
            TraceEvent::now(kind)
                .with_fingerprint(fingerprint.as_deref())
                .with_action(button_id)
        };

        if is_cancel {
            self.tracer.log(&trace(FormEventKind::Cancelled));
            return Ok(SubmitEvent::Cancelled { data });
        }

        let Some(transport) = &self.transport else {
            self.tracer.log(&trace(FormEventKind::Submitted));
            return Ok(SubmitEvent::Submitted { data, response: None });
        };

        let outcome = SubmitMethod::parse(self.config.as_ref().and_then(|c| c.method.as_deref()))
            .and_then(|method| transport.submit(method, &data));

        match outcome {
            Ok(SubmitOutcome::Accepted(response)) => {
                self.tracer.log(&trace(FormEventKind::Submitted));
                info!("form submitted");
                self.set_errors(None);
                Ok(SubmitEvent::Submitted {
                    data,
                    response: Some(response),
                })
            }
            Ok(SubmitOutcome::Rejected(errors)) => {
                self.tracer
                    .log(&trace(FormEventKind::Rejected).with_fields(errors.keys().cloned()));
                warn!("submission rejected: {} field errors", errors.len());
                self.set_errors(Some(&errors));
                Ok(SubmitEvent::Rejected { data, errors })
            }
            Err(e) => {
                self.tracer.log(&trace(FormEventKind::Failed).with_detail(&e));
                Err(e.into())
            }
        }
    }

    /// Enter in a field submits without a button.
    pub fn submit_on_enter(&mut self) -> Result<SubmitEvent, FormError> {
        self.submitted(None, false)
    }

    pub fn form_title(&self) -> Option<&str> {
        self.form_title.as_deref()
    }

    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    pub fn config(&self) -> Option<&FormConfig> {
        self.config.as_ref()
    }

    pub fn tree(&self) -> Option<&ControlTree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut ControlTree> {
        self.tree.as_mut()
    }

    pub fn valid(&self) -> bool {
        self.tree.as_ref().is_none_or(ControlTree::valid)
    }

    pub fn value(&self) -> Map<String, Value> {
        self.tree.as_ref().map(ControlTree::value).unwrap_or_default()
    }
}
