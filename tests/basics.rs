use ferrous_wire::{
    DiError, Injectable, Lifetime, Resolver, ServiceCollection, ServiceCollectionExt, ServiceModule,
    TypeMetadata, DiResult,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[test]
fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize);
    sc.add_singleton("hello".to_string());

    let sp = sc.build();

    let num1 = sp.get_required::<usize>();
    let num2 = sp.get_required::<usize>();
    let str1 = sp.get_required::<String>();
    let str2 = sp.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
    assert!(Arc::ptr_eq(&str1, &str2));
}

#[test]
fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { port: 8080 });
    sc.add_singleton_factory::<Server, _>(|r| {
        Ok(Server {
            config: r.get::<Config>()?,
            name: "test-server".to_string(),
        })
    });

    let sp = sc.build();
    let server = sp.get_required::<Server>();
    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "test-server");
    assert!(Arc::ptr_eq(&server, &sp.get_required::<Server>()));
}

#[test]
fn test_transient_factory_runs_per_request() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<u32, _>(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)));

    let sp = sc.build();
    assert_eq!(*sp.get_required::<u32>(), 0);
    assert_eq!(*sp.get_required::<u32>(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

trait Logger: Send + Sync {
    fn log(&self, msg: &str) -> String;
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) -> String {
        format!("[console] {}", msg)
    }
}

trait Repository: Send + Sync {
    fn save(&self, item: &str) -> String;
}

struct LoggedRepository {
    logger: Arc<dyn Logger>,
}

impl Repository for LoggedRepository {
    fn save(&self, item: &str) -> String {
        self.logger.log(item)
    }
}

impl Injectable for LoggedRepository {
    fn describe(meta: &mut TypeMetadata<Self>) {
        meta.constructor(|(logger,): (Arc<dyn Logger>,)| Ok(LoggedRepository { logger }));
    }
}

#[test]
fn test_trait_contracts_with_constructor_injection() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_arc::<dyn Logger>(Arc::new(ConsoleLogger));
    sc.add_singleton_component::<dyn Repository, LoggedRepository, _>(|r| r);

    let sp = sc.build();
    let repo = sp.get_required::<dyn Repository>();
    assert_eq!(repo.save("user"), "[console] user");
    assert!(Arc::ptr_eq(&repo, &sp.get_required::<dyn Repository>()));
}

#[test]
fn test_trait_factory() {
    let mut sc = ServiceCollection::new();
    sc.add_transient_trait_factory::<dyn Logger, _>(|_| Ok(Arc::new(ConsoleLogger)));

    let sp = sc.build();
    let a = sp.get_required::<dyn Logger>();
    let b = sp.get_required::<dyn Logger>();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.log("x"), "[console] x");
}

struct Overloaded {
    used: &'static str,
}

impl Injectable for Overloaded {
    fn describe(meta: &mut TypeMetadata<Self>) {
        meta.constructor(|()| Ok(Overloaded { used: "none" }))
            .constructor(|(_l,): (Arc<dyn Logger>,)| Ok(Overloaded { used: "logger" }))
            .constructor(|(_l, _n): (Arc<dyn Logger>, Arc<u8>)| Ok(Overloaded { used: "logger+u8" }));
    }
}

#[test]
fn test_greatest_arity_constructor_is_selected() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_arc::<dyn Logger>(Arc::new(ConsoleLogger));
    sc.add_singleton(3u8);
    sc.add_transient_type::<Overloaded>();

    let sp = sc.build();
    assert_eq!(sp.get_required::<Overloaded>().used, "logger+u8");
}

#[test]
fn test_try_get() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1i32);
    sc.add_singleton_type::<LoggedRepository>();
    let sp = sc.build();

    assert_eq!(sp.try_get::<i32>().unwrap().map(|v| *v), Some(1));
    assert!(sp.try_get::<i64>().unwrap().is_none());

    // a missing dependency is still an error
    let err = sp.try_get::<LoggedRepository>().err().expect("dependency missing");
    assert!(matches!(err.root_cause(), DiError::NotFound(name) if name.contains("Logger")));
}

#[test]
fn test_try_get_inside_factory() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<String, _>(|r| {
        let port = r.try_get::<u16>()?.map(|p| *p).unwrap_or(80);
        Ok(format!("port {}", port))
    });
    let sp = sc.build();

    assert_eq!(&*sp.get_required::<String>(), "port 80");
}

#[test]
fn test_descriptors() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u8);
    sc.add_transient_component::<dyn Repository, LoggedRepository, _>(|r| r);

    let descriptors = sc.get_service_descriptors();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors[0].type_name(), "u8");
    assert!(!descriptors[0].is_component());
    assert!(descriptors[1].is_component());
    assert_eq!(descriptors[1].lifetime, Lifetime::Transient);
    assert!(descriptors[1].impl_type_name.unwrap().contains("LoggedRepository"));

    let sp = sc.build();
    assert_eq!(sp.get_service_descriptors().len(), 2);
}

struct LoggingModule;

impl ServiceModule for LoggingModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        services.add_singleton_arc::<dyn Logger>(Arc::new(ConsoleLogger));
        services.add_singleton_component::<dyn Repository, LoggedRepository, _>(|r| r);
        Ok(())
    }
}

#[test]
fn test_modules() {
    let sp = ServiceCollection::new().add_module(LoggingModule).unwrap().build();
    assert_eq!(sp.get_required::<dyn Repository>().save("m"), "[console] m");
}
